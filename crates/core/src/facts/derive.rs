use serde_json::Value;

use crate::facts::definition::{CompositeLogic, FactDefinition, FactDerivation};
use crate::facts::snapshot::FactSnapshot;

/// Computes custom fact values from the lead data collected so far.
///
/// Definitions resolve in declaration order, so a `composite` fact can build on
/// core facts and on custom facts declared before it.
#[derive(Clone, Debug, Default)]
pub struct FactResolver;

impl FactResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(
        &self,
        definitions: &[FactDefinition],
        base: FactSnapshot,
        fields: &Value,
    ) -> FactSnapshot {
        let mut snapshot = base;

        for definition in definitions {
            let value = self.derive(definition, &snapshot, fields);
            tracing::trace!(
                event_name = "facts.derive.resolved",
                fact = %definition.name,
                derivation = definition.derivation.as_str(),
                value,
                "custom fact resolved"
            );
            snapshot.set(definition.name.clone(), value);
        }

        snapshot
    }

    fn derive(&self, definition: &FactDefinition, snapshot: &FactSnapshot, fields: &Value) -> bool {
        match definition.derivation {
            FactDerivation::Exists | FactDerivation::NotExists => {
                let Some(field) = definition.field.as_deref() else {
                    log_missing_operand(definition, "field");
                    return false;
                };
                let present = field_exists(lookup_field(fields, field));
                if definition.derivation == FactDerivation::Exists {
                    present
                } else {
                    !present
                }
            }
            FactDerivation::Equals => {
                let Some(field) = definition.field.as_deref() else {
                    log_missing_operand(definition, "field");
                    return false;
                };
                let actual = lookup_field(fields, field).unwrap_or(&Value::Null);
                let expected = definition.value.as_ref().unwrap_or(&Value::Null);
                actual == expected
            }
            FactDerivation::AnyExists | FactDerivation::AllExists => {
                if definition.fields.is_empty() {
                    log_missing_operand(definition, "fields");
                    return false;
                }
                let mut present =
                    definition.fields.iter().map(|field| field_exists(lookup_field(fields, field)));
                if definition.derivation == FactDerivation::AnyExists {
                    present.any(|exists| exists)
                } else {
                    present.all(|exists| exists)
                }
            }
            FactDerivation::Composite => {
                if definition.conditions.is_empty() {
                    log_missing_operand(definition, "conditions");
                    return false;
                }
                let mut holds =
                    definition.conditions.iter().map(|condition| snapshot.is_true(&condition.fact));
                match definition.logic.unwrap_or_default() {
                    CompositeLogic::All => holds.all(|value| value),
                    CompositeLogic::Any => holds.any(|value| value),
                }
            }
        }
    }
}

fn log_missing_operand(definition: &FactDefinition, operand: &'static str) {
    tracing::debug!(
        event_name = "facts.derive.missing_operand",
        fact = %definition.name,
        derivation = definition.derivation.as_str(),
        operand,
        "custom fact has no operand to evaluate; resolving to false"
    );
}

/// Looks up a dotted path such as `contact.phone` or `visits.0.date`.
pub fn lookup_field<'a>(fields: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(fields, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

fn field_exists(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}
