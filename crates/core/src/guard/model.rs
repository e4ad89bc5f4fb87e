use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Operator keys recognized on a guard node, in dispatch order.
pub const GUARD_OPERATORS: [GuardOperator; 6] = [
    GuardOperator::All,
    GuardOperator::Any,
    GuardOperator::Not,
    GuardOperator::Eq,
    GuardOperator::Neq,
    GuardOperator::Exists,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardOperator {
    All,
    Any,
    Not,
    Eq,
    Neq,
    Exists,
}

impl GuardOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
            Self::Not => "not",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Exists => "exists",
        }
    }
}

impl fmt::Display for GuardOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value a fact can take. String facts carry `Text`, boolean facts carry `Bool`,
/// and every fact may be `Null` while still unknown.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FactValue {
    Null,
    Bool(bool),
    Text(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported fact value `{0}` (expected a string, a boolean, or null)")]
pub struct UnsupportedFactValue(pub String);

impl FactValue {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Text(text) => Value::String(text.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl TryFrom<Value> for FactValue {
    type Error = UnsupportedFactValue;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value).ok_or_else(|| UnsupportedFactValue(value.to_string()))
    }
}

impl From<FactValue> for Value {
    fn from(value: FactValue) -> Self {
        value.to_json()
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A node of the guard tree deciding whether a priority may activate.
///
/// The JSON form is the externally tagged object stored in `Priority.guard`:
/// `{"all": [...]}`, `{"not": {...}}`, `{"eq": ["operation_type", "RENT"]}`,
/// `{"exists": "has_contact"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardExpression {
    All(Vec<GuardExpression>),
    Any(Vec<GuardExpression>),
    Not(Box<GuardExpression>),
    Eq(String, FactValue),
    Neq(String, FactValue),
    Exists(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GuardParseError {
    #[error("guard expression is malformed: {0}")]
    Malformed(String),
}

impl GuardExpression {
    pub fn operator(&self) -> GuardOperator {
        match self {
            Self::All(_) => GuardOperator::All,
            Self::Any(_) => GuardOperator::Any,
            Self::Not(_) => GuardOperator::Not,
            Self::Eq(..) => GuardOperator::Eq,
            Self::Neq(..) => GuardOperator::Neq,
            Self::Exists(_) => GuardOperator::Exists,
        }
    }

    /// Converts untrusted JSON into the typed tree. Run the validator first to
    /// get path-qualified messages; this only reports the first shape problem.
    ///
    /// `null` children are absent expressions: they drop out of `all`/`any`,
    /// and `{"not": null}` negates the empty guard.
    pub fn from_json(value: &Value) -> Result<Self, GuardParseError> {
        serde_json::from_value(without_absent_children(value))
            .map_err(|error| GuardParseError::Malformed(error.to_string()))
    }

    pub fn to_json(&self) -> Value {
        let (operator, body) = match self {
            Self::All(children) | Self::Any(children) => {
                (self.operator(), Value::Array(children.iter().map(Self::to_json).collect()))
            }
            Self::Not(child) => (self.operator(), child.to_json()),
            Self::Eq(key, value) | Self::Neq(key, value) => {
                (self.operator(), Value::Array(vec![Value::String(key.clone()), value.to_json()]))
            }
            Self::Exists(key) => (self.operator(), Value::String(key.clone())),
        };

        let mut node = serde_json::Map::new();
        node.insert(operator.as_str().to_string(), body);
        Value::Object(node)
    }
}

fn without_absent_children(node: &Value) -> Value {
    let Value::Object(fields) = node else {
        return node.clone();
    };

    let cleaned = fields
        .iter()
        .map(|(operator, body)| {
            let body = match (operator.as_str(), body) {
                ("all" | "any", Value::Array(children)) => Value::Array(
                    children
                        .iter()
                        .filter(|child| !child.is_null())
                        .map(without_absent_children)
                        .collect(),
                ),
                ("not", Value::Null) => Value::Object(
                    [("all".to_string(), Value::Array(Vec::new()))].into_iter().collect(),
                ),
                ("not", child) => without_absent_children(child),
                _ => body.clone(),
            };
            (operator.clone(), body)
        })
        .collect();

    Value::Object(cleaned)
}
