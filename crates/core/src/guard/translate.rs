use serde_json::{Map, Value};

use crate::facts::FactRegistry;
use crate::guard::model::GuardExpression;

pub const NO_RESTRICTIONS: &str = "Sin restricciones (siempre elegible)";
pub const UNKNOWN_CONDITION: &str = "Condición desconocida";

/// Renders a guard as the Spanish preview shown next to a priority.
pub fn translate_guard(guard: Option<&GuardExpression>, facts: &FactRegistry) -> String {
    let raw = guard.map(GuardExpression::to_json);
    translate_guard_json(raw.as_ref(), facts)
}

/// Same as [`translate_guard`] for raw JSON. Shapes the validator would flag
/// degrade to [`UNKNOWN_CONDITION`] instead of failing.
pub fn translate_guard_json(guard: Option<&Value>, facts: &FactRegistry) -> String {
    match guard {
        None | Some(Value::Null) => NO_RESTRICTIONS.to_string(),
        Some(expression) => translate_expression(expression, 0, facts),
    }
}

fn translate_expression(expression: &Value, level: usize, facts: &FactRegistry) -> String {
    let Value::Object(fields) = expression else {
        return UNKNOWN_CONDITION.to_string();
    };

    if let Some(body) = operand(fields, "all") {
        return match body {
            Value::Array(children) => join_children(children, level, "Y", facts),
            _ => UNKNOWN_CONDITION.to_string(),
        };
    }
    if let Some(body) = operand(fields, "any") {
        return match body {
            Value::Array(children) => join_children(children, level, "O", facts),
            _ => UNKNOWN_CONDITION.to_string(),
        };
    }
    if let Some(child) = operand(fields, "not") {
        return format!("NO {}", translate_expression(child, level + 1, facts));
    }
    if let Some(body) = operand(fields, "eq") {
        return comparison(body, "sea", facts);
    }
    if let Some(body) = operand(fields, "neq") {
        return comparison(body, "NO sea", facts);
    }
    if let Some(Value::String(key)) = operand(fields, "exists") {
        return format!("{} exista", facts.label(key));
    }

    UNKNOWN_CONDITION.to_string()
}

fn operand<'a>(fields: &'a Map<String, Value>, operator: &str) -> Option<&'a Value> {
    fields.get(operator).filter(|value| !value.is_null())
}

fn join_children(children: &[Value], level: usize, connector: &str, facts: &FactRegistry) -> String {
    let parts: Vec<String> =
        children.iter().map(|child| translate_expression(child, level + 1, facts)).collect();

    if level == 0 {
        parts.join(&format!("\n✓ {connector} "))
    } else {
        format!("({})", parts.join(&format!(" {connector} ")))
    }
}

fn comparison(body: &Value, verb: &str, facts: &FactRegistry) -> String {
    match body {
        Value::Array(items) if items.len() == 2 => match &items[0] {
            Value::String(key) => {
                format!("{} {verb} {}", facts.label(key), format_value(&items[1]))
            }
            _ => UNKNOWN_CONDITION.to_string(),
        },
        _ => UNKNOWN_CONDITION.to_string(),
    }
}

/// Formats a comparison value for display: `nulo`, `verdadero`, `falso`,
/// quoted strings, and plain string coercion for anything else.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "nulo".to_string(),
        Value::Bool(true) => "verdadero".to_string(),
        Value::Bool(false) => "falso".to_string(),
        Value::String(text) => format!("\"{text}\""),
        other => coerce(other),
    }
}

fn coerce(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        // Whole floats print without a fraction: `1.0` renders as `1`.
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() => float.to_string(),
            _ => number.to_string(),
        },
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| if item.is_null() { String::new() } else { coerce(item) })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
