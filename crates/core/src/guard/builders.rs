use serde_json::Value;

use crate::guard::model::{FactValue, GuardExpression};

/// The "configuring, no conditions yet" state an editor starts from.
pub fn create_empty_guard() -> GuardExpression {
    GuardExpression::All(Vec::new())
}

pub fn create_eq_condition(
    fact_key: impl Into<String>,
    value: impl Into<FactValue>,
) -> GuardExpression {
    GuardExpression::Eq(fact_key.into(), value.into())
}

pub fn create_neq_condition(
    fact_key: impl Into<String>,
    value: impl Into<FactValue>,
) -> GuardExpression {
    GuardExpression::Neq(fact_key.into(), value.into())
}

pub fn create_exists_condition(fact_key: impl Into<String>) -> GuardExpression {
    GuardExpression::Exists(fact_key.into())
}

pub fn wrap_with_not(expression: GuardExpression) -> GuardExpression {
    GuardExpression::Not(Box::new(expression))
}

/// True for an absent guard or an empty top-level `all`/`any`.
///
/// Only the top level is inspected: `{"all": [{"any": []}]}` is not empty.
pub fn is_empty_guard(guard: Option<&GuardExpression>) -> bool {
    match guard {
        None => true,
        Some(GuardExpression::All(children)) | Some(GuardExpression::Any(children)) => {
            children.is_empty()
        }
        Some(_) => false,
    }
}

/// Every fact key referenced by `eq`, `neq`, or `exists`, deduplicated in
/// discovery order.
pub fn used_fact_keys(guard: Option<&GuardExpression>) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(guard) = guard {
        collect_keys(guard, &mut keys);
    }
    keys
}

fn collect_keys(expression: &GuardExpression, keys: &mut Vec<String>) {
    match expression {
        GuardExpression::All(children) | GuardExpression::Any(children) => {
            for child in children {
                collect_keys(child, keys);
            }
        }
        GuardExpression::Not(child) => collect_keys(child, keys),
        GuardExpression::Eq(key, _) | GuardExpression::Neq(key, _) | GuardExpression::Exists(key) => {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
}

/// [`used_fact_keys`] over a stored JSON guard. Works on guards that do not
/// parse into [`GuardExpression`], so deleting a fact still warns about them.
pub fn used_fact_keys_json(guard: Option<&Value>) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(guard) = guard {
        collect_keys_json(guard, &mut keys);
    }
    keys
}

fn collect_keys_json(node: &Value, keys: &mut Vec<String>) {
    let Value::Object(fields) = node else {
        return;
    };

    for group in ["all", "any"] {
        if let Some(Value::Array(children)) = fields.get(group) {
            for child in children {
                collect_keys_json(child, keys);
            }
        }
    }
    if let Some(child) = fields.get("not") {
        collect_keys_json(child, keys);
    }

    let comparisons = ["eq", "neq"]
        .into_iter()
        .filter_map(|operator| match fields.get(operator) {
            Some(Value::Array(items)) => items.first().and_then(Value::as_str),
            _ => None,
        });
    let exists = fields.get("exists").and_then(Value::as_str);

    for key in comparisons.chain(exists) {
        if !keys.iter().any(|known| known == key) {
            keys.push(key.to_string());
        }
    }
}

/// Number of leaf conditions, shown next to a valid guard.
pub fn count_conditions(guard: Option<&GuardExpression>) -> usize {
    fn count(expression: &GuardExpression) -> usize {
        match expression {
            GuardExpression::All(children) | GuardExpression::Any(children) => {
                children.iter().map(count).sum()
            }
            GuardExpression::Not(child) => count(child),
            GuardExpression::Eq(..) | GuardExpression::Neq(..) | GuardExpression::Exists(_) => 1,
        }
    }

    guard.map(count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::{
        count_conditions, create_empty_guard, create_eq_condition, create_exists_condition,
        create_neq_condition, is_empty_guard, used_fact_keys, used_fact_keys_json, wrap_with_not,
    };
    use crate::guard::{FactValue, GuardExpression};

    #[test]
    fn constructors_produce_wire_shapes() {
        assert_eq!(create_empty_guard().to_json(), json!({ "all": [] }));
        assert_eq!(create_eq_condition("operation_type", "RENT").to_json(), json!({ "eq": ["operation_type", "RENT"] }));
        assert_eq!(
            create_neq_condition("has_contact", FactValue::Null).to_json(),
            json!({ "neq": ["has_contact", null] })
        );
        assert_eq!(create_exists_condition("has_contact").to_json(), json!({ "exists": "has_contact" }));
        assert_eq!(
            wrap_with_not(create_exists_condition("has_contact")).to_json(),
            json!({ "not": { "exists": "has_contact" } })
        );
    }

    #[test]
    fn emptiness_is_shallow() {
        assert!(is_empty_guard(None));
        assert!(is_empty_guard(Some(&GuardExpression::All(vec![]))));
        assert!(is_empty_guard(Some(&GuardExpression::Any(vec![]))));
        assert!(!is_empty_guard(Some(&GuardExpression::All(vec![create_exists_condition(
            "has_contact"
        )]))));
        assert!(!is_empty_guard(Some(&GuardExpression::All(vec![GuardExpression::Any(vec![])]))));
        assert!(!is_empty_guard(Some(&create_exists_condition("has_contact"))));
    }

    #[test]
    fn used_fact_keys_walks_the_whole_tree() {
        let guard = GuardExpression::All(vec![
            create_eq_condition("a", "1"),
            GuardExpression::Any(vec![create_neq_condition("b", "2"), create_exists_condition("c")]),
            wrap_with_not(create_exists_condition("d")),
            create_exists_condition("a"),
        ]);

        let keys = used_fact_keys(Some(&guard));
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        let as_set: BTreeSet<_> = keys.into_iter().collect();
        assert_eq!(as_set.len(), 4);
        assert!(used_fact_keys(None).is_empty());
    }

    #[test]
    fn raw_key_walk_survives_values_the_typed_model_rejects() {
        let raw = json!({
            "all": [
                { "exists": "has_email" },
                { "eq": ["has_contact", 1] },
                { "not": { "neq": ["operation_type", 2.5] } },
                { "any": [{ "exists": "has_email" }, null, "junk"] }
            ]
        });

        assert!(GuardExpression::from_json(&raw).is_err());
        assert_eq!(
            used_fact_keys_json(Some(&raw)),
            vec!["has_email", "has_contact", "operation_type"]
        );
        assert!(used_fact_keys_json(None).is_empty());
        assert!(used_fact_keys_json(Some(&json!({ "eq": [3, true] }))).is_empty());
    }

    #[test]
    fn raw_and_typed_key_walks_agree_on_valid_guards() {
        let guard = GuardExpression::Any(vec![
            create_exists_condition("has_contact"),
            wrap_with_not(create_eq_condition("operation_type", "RENT")),
        ]);
        assert_eq!(used_fact_keys_json(Some(&guard.to_json())), used_fact_keys(Some(&guard)));
    }

    #[test]
    fn counts_leaf_conditions() {
        let guard = GuardExpression::Any(vec![
            create_exists_condition("has_contact"),
            wrap_with_not(GuardExpression::All(vec![
                create_eq_condition("operation_type", "RENT"),
                create_eq_condition("has_budget", true),
            ])),
        ]);
        assert_eq!(count_conditions(Some(&guard)), 3);
        assert_eq!(count_conditions(Some(&create_empty_guard())), 0);
        assert_eq!(count_conditions(None), 0);
    }
}
