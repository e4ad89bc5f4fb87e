use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::facts::FactRegistry;
use crate::guard::model::{GuardExpression, GuardOperator, GUARD_OPERATORS};

pub const ROOT_PATH: &str = "root";
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Default for GuardValidation {
    fn default() -> Self {
        Self { valid: true, errors: Vec::new() }
    }
}

impl GuardValidation {
    fn from_errors(errors: Vec<String>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }
}

/// Checks guard trees for structure and for fact keys unknown to the registry.
///
/// Problems are collected as `"<path>: <message>"` strings in pre-order; nothing
/// here panics or returns `Err`, so it is safe to run on every edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardValidator {
    max_depth: usize,
}

impl Default for GuardValidator {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl GuardValidator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn validate(
        &self,
        guard: Option<&GuardExpression>,
        facts: &FactRegistry,
    ) -> GuardValidation {
        let raw = guard.map(GuardExpression::to_json);
        self.validate_json(raw.as_ref(), ROOT_PATH, facts)
    }

    /// Validates an untrusted JSON guard. Absent and `null` guards mean
    /// "no restriction" and are valid.
    pub fn validate_json(
        &self,
        guard: Option<&Value>,
        path: &str,
        facts: &FactRegistry,
    ) -> GuardValidation {
        let mut errors = Vec::new();
        match guard {
            None | Some(Value::Null) => {}
            Some(node) => self.walk(node, path, 0, facts, &mut errors),
        }
        GuardValidation::from_errors(errors)
    }

    fn walk(
        &self,
        node: &Value,
        path: &str,
        depth: usize,
        facts: &FactRegistry,
        errors: &mut Vec<String>,
    ) {
        if depth > self.max_depth {
            errors.push(format!(
                "{path}: expression nesting exceeds maximum depth of {}",
                self.max_depth
            ));
            return;
        }

        let fields = match node {
            Value::Object(fields) => fields,
            // A null child is an absent expression, valid like an absent root.
            Value::Null => return,
            _ => {
                errors.push(format!("{path}: expression must be an object"));
                return;
            }
        };

        let found: Vec<GuardOperator> = GUARD_OPERATORS
            .into_iter()
            .filter(|operator| fields.contains_key(operator.as_str()))
            .collect();

        if found.is_empty() {
            errors.push(format!("{path}: must have at least one valid operator"));
            return;
        }
        if found.len() > 1 {
            let names: Vec<&str> = found.iter().map(GuardOperator::as_str).collect();
            errors.push(format!(
                "{path}: only one operator per expression; found: {}",
                names.join(", ")
            ));
        }

        for operator in found {
            self.check_operator(operator, fields, path, depth, facts, errors);
        }
    }

    fn check_operator(
        &self,
        operator: GuardOperator,
        fields: &Map<String, Value>,
        path: &str,
        depth: usize,
        facts: &FactRegistry,
        errors: &mut Vec<String>,
    ) {
        let name = operator.as_str();
        let Some(body) = fields.get(name) else {
            return;
        };

        match operator {
            GuardOperator::Eq | GuardOperator::Neq => match body {
                Value::Array(items) if items.len() == 2 => match &items[0] {
                    Value::String(key) => check_fact_key(key, name, path, facts, errors),
                    _ => errors.push(format!("{path}.{name}[0]: fact key must be a string")),
                },
                _ => errors.push(format!("{path}.{name}: must be an array of [factKey, value]")),
            },
            GuardOperator::Exists => match body {
                Value::String(key) => check_fact_key(key, name, path, facts, errors),
                _ => errors.push(format!("{path}.{name}: must be a fact key string")),
            },
            GuardOperator::All | GuardOperator::Any => match body {
                Value::Array(children) => {
                    for (index, child) in children.iter().enumerate() {
                        let child_path = format!("{path}.{name}[{index}]");
                        self.walk(child, &child_path, depth + 1, facts, errors);
                    }
                }
                _ => errors.push(format!("{path}.{name}: must be an array of expressions")),
            },
            GuardOperator::Not => {
                self.walk(body, &format!("{path}.not"), depth + 1, facts, errors);
            }
        }
    }
}

fn check_fact_key(
    key: &str,
    operator: &str,
    path: &str,
    facts: &FactRegistry,
    errors: &mut Vec<String>,
) {
    if !facts.contains(key) {
        errors.push(format!(
            "{path}.{operator}: Fact key \"{key}\" no es válido (no existe en los facts disponibles)"
        ));
    }
}

pub fn validate_guard(guard: Option<&GuardExpression>, facts: &FactRegistry) -> GuardValidation {
    GuardValidator::default().validate(guard, facts)
}

pub fn validate_guard_json(
    guard: Option<&Value>,
    path: &str,
    facts: &FactRegistry,
) -> GuardValidation {
    GuardValidator::default().validate_json(guard, path, facts)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{validate_guard, validate_guard_json, GuardValidator, ROOT_PATH};
    use crate::facts::{FactMeta, FactRegistry};
    use crate::guard::builders::{create_eq_condition, create_exists_condition};
    use crate::guard::GuardExpression;

    fn check(raw: Value) -> super::GuardValidation {
        validate_guard_json(Some(&raw), ROOT_PATH, &FactRegistry::core())
    }

    #[test]
    fn absent_and_null_guards_are_valid() {
        let core = FactRegistry::core();
        let absent = validate_guard_json(None, ROOT_PATH, &core);
        let null = validate_guard_json(Some(&Value::Null), ROOT_PATH, &core);

        assert!(absent.valid && absent.errors.is_empty());
        assert_eq!(absent, null);
        assert!(validate_guard(None, &core).valid);
    }

    #[test]
    fn validation_is_idempotent() {
        let raw = json!({ "all": [{ "eq": ["bad_key", 1] }, { "exists": 3 }] });
        assert_eq!(check(raw.clone()), check(raw));
    }

    #[test]
    fn two_operators_on_one_node_are_reported_together() {
        let result = check(json!({ "eq": ["has_contact", true], "exists": "has_contact" }));

        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["root: only one operator per expression; found: eq, exists".to_string()]
        );
    }

    #[test]
    fn node_without_operator_is_rejected() {
        let result = check(json!({ "foo": ["has_contact"] }));
        assert_eq!(result.errors, vec!["root: must have at least one valid operator".to_string()]);
    }

    #[test]
    fn unknown_fact_key_is_rejected_and_known_key_accepted() {
        let unknown = check(json!({ "eq": ["nonexistent_fact", true] }));
        assert!(!unknown.valid);
        assert_eq!(
            unknown.errors,
            vec![
                "root.eq: Fact key \"nonexistent_fact\" no es válido (no existe en los facts disponibles)"
                    .to_string()
            ]
        );

        assert!(check(json!({ "exists": "has_contact" })).valid);
    }

    #[test]
    fn child_errors_accumulate_with_paths() {
        let result =
            check(json!({ "all": [{ "eq": ["bad_key", 1] }, { "exists": "has_contact" }] }));

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("root.all[0].eq: Fact key \"bad_key\""));
    }

    #[test]
    fn errors_are_reported_in_pre_order() {
        let result = check(json!({
            "any": [
                { "not": { "exists": "ghost" } },
                { "eq": "operation_type" },
                { "neq": [7, "RENT"] },
                { "all": "nope", "any": [] }
            ]
        }));

        assert_eq!(
            result.errors,
            vec![
                "root.any[0].not.exists: Fact key \"ghost\" no es válido (no existe en los facts disponibles)".to_string(),
                "root.any[1].eq: must be an array of [factKey, value]".to_string(),
                "root.any[2].neq[0]: fact key must be a string".to_string(),
                "root.any[3]: only one operator per expression; found: all, any".to_string(),
                "root.any[3].all: must be an array of expressions".to_string(),
            ]
        );
    }

    #[test]
    fn malformed_shapes_never_panic() {
        for raw in [
            json!("has_contact"),
            json!([1, 2]),
            json!({ "exists": null }),
            json!({ "all": [null, 4, { "eq": [] }] }),
        ] {
            let result = check(raw);
            assert!(!result.valid);
        }
    }

    #[test]
    fn null_children_are_absent_expressions() {
        assert_eq!(check(json!({ "not": null })).errors, Vec::<String>::new());

        let mixed = check(json!({ "all": [null, { "exists": "has_contact" }] }));
        assert!(mixed.valid, "{mixed:?}");

        let with_bad_sibling = check(json!({ "any": [null, 4, { "exists": "ghost" }] }));
        assert_eq!(
            with_bad_sibling.errors,
            vec![
                "root.any[1]: expression must be an object".to_string(),
                "root.any[2].exists: Fact key \"ghost\" no es válido (no existe en los facts disponibles)".to_string(),
            ]
        );
    }

    #[test]
    fn deep_nesting_is_cut_off() {
        let mut raw = json!({ "exists": "has_contact" });
        for _ in 0..10 {
            raw = json!({ "not": raw });
        }

        let shallow = GuardValidator::new(4).validate_json(Some(&raw), ROOT_PATH, &FactRegistry::core());
        assert_eq!(shallow.errors.len(), 1);
        assert!(shallow.errors[0].contains("maximum depth of 4"));

        assert!(check(raw).valid);
    }

    #[test]
    fn typed_guards_validate_against_synthetic_registries() {
        let registry = FactRegistry::new()
            .with_fact("has_contact", FactMeta::boolean("has_contact", ""))
            .with_fact(
                "operation_type",
                FactMeta::string("Tipo de operación", ["RENT", "SELL"], ""),
            );
        let guard = GuardExpression::All(vec![
            create_exists_condition("has_contact"),
            create_eq_condition("operation_type", "RENT"),
        ]);

        assert!(validate_guard(Some(&guard), &registry).valid);

        let stale = GuardExpression::Any(vec![create_exists_condition("property_found")]);
        let result = validate_guard(Some(&stale), &registry);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("root.any[0].exists"));
    }
}
