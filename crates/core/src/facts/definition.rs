use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the conversation engine computes a custom fact's live value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactDerivation {
    Exists,
    Equals,
    AnyExists,
    AllExists,
    Composite,
    NotExists,
}

impl FactDerivation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::Equals => "equals",
            Self::AnyExists => "any_exists",
            Self::AllExists => "all_exists",
            Self::Composite => "composite",
            Self::NotExists => "not_exists",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeLogic {
    #[default]
    All,
    Any,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCondition {
    pub fact: String,
}

/// A per-agent custom fact, stored under `orchestration.factDefinitions`.
/// Custom facts are always boolean once derived.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub derivation: FactDerivation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<CompositeLogic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<FactCondition>,
}

impl FactDefinition {
    pub fn new(name: impl Into<String>, derivation: FactDerivation) -> Self {
        Self {
            name: name.into(),
            derivation,
            field: None,
            fields: Vec::new(),
            value: None,
            logic: None,
            conditions: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_conditions<I, S>(mut self, logic: CompositeLogic, facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logic = Some(logic);
        self.conditions = facts.into_iter().map(|fact| FactCondition { fact: fact.into() }).collect();
        self
    }
}
