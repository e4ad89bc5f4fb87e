use std::collections::BTreeMap;

use crate::facts::registry::FactMeta;

pub const OPERATION_TYPE: &str = "operation_type";
pub const PROPERTY_TYPE: &str = "property_type";
pub const PROPERTY_FOUND: &str = "property_found";
pub const HAS_CONTACT: &str = "has_contact";
pub const HAS_SEARCH_PARAMS: &str = "has_search_params";
pub const HAS_BUDGET: &str = "has_budget";
pub const VISIT_SCHEDULED: &str = "visit_scheduled";
pub const WANTS_HUMAN_AGENT: &str = "wants_human_agent";

/// Facts the conversation engine derives for every agent.
pub fn core_facts() -> BTreeMap<String, FactMeta> {
    let entries = [
        (
            OPERATION_TYPE,
            FactMeta::string(
                "Tipo de operación",
                ["RENT", "SELL"],
                "Operación inmobiliaria detectada en la conversación (alquiler o venta)",
            ),
        ),
        (
            PROPERTY_TYPE,
            FactMeta::string(
                "Tipo de propiedad",
                ["HOUSE", "APARTMENT", "LAND", "COMMERCIAL"],
                "Tipo de inmueble que busca el lead",
            ),
        ),
        (
            PROPERTY_FOUND,
            FactMeta::boolean(
                "Propiedad encontrada",
                "Se identificó una propiedad concreta del catálogo",
            ),
        ),
        (
            HAS_CONTACT,
            FactMeta::boolean("Tiene contacto", "El lead compartió teléfono o email"),
        ),
        (
            HAS_SEARCH_PARAMS,
            FactMeta::boolean(
                "Tiene parámetros de búsqueda",
                "Se conocen zona, presupuesto o características buscadas",
            ),
        ),
        (HAS_BUDGET, FactMeta::boolean("Tiene presupuesto", "El lead indicó un presupuesto")),
        (
            VISIT_SCHEDULED,
            FactMeta::boolean("Visita agendada", "Ya existe una visita agendada con el lead"),
        ),
        (
            WANTS_HUMAN_AGENT,
            FactMeta::boolean(
                "Pide hablar con un asesor",
                "El lead pidió ser atendido por una persona",
            ),
        ),
    ];

    entries.into_iter().map(|(key, meta)| (key.to_string(), meta)).collect()
}

pub fn is_core_fact(key: &str) -> bool {
    matches!(
        key,
        OPERATION_TYPE
            | PROPERTY_TYPE
            | PROPERTY_FOUND
            | HAS_CONTACT
            | HAS_SEARCH_PARAMS
            | HAS_BUDGET
            | VISIT_SCHEDULED
            | WANTS_HUMAN_AGENT
    )
}

#[cfg(test)]
mod tests {
    use super::{core_facts, is_core_fact, OPERATION_TYPE};
    use crate::facts::registry::FactType;
    use crate::guard::FactValue;

    #[test]
    fn every_core_fact_allows_unknown() {
        let facts = core_facts();
        assert_eq!(facts.len(), 8);
        for (key, meta) in &facts {
            assert!(is_core_fact(key), "{key} should be recognized as core");
            assert!(meta.values.contains(&FactValue::Null), "{key} should allow null");
        }
    }

    #[test]
    fn operation_type_is_an_enumerated_string() {
        let facts = core_facts();
        let meta = &facts[OPERATION_TYPE];
        assert_eq!(meta.fact_type, FactType::String);
        assert_eq!(
            meta.values,
            vec![FactValue::from("RENT"), FactValue::from("SELL"), FactValue::Null]
        );
    }
}
