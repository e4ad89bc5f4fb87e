use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::facts::builtin::core_facts;
use crate::facts::definition::FactDefinition;
use crate::guard::{FactValue, GuardExpression};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactType {
    String,
    Boolean,
}

impl fmt::Display for FactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Boolean => f.write_str("boolean"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactSource {
    #[default]
    Core,
    Custom,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactMeta {
    pub label: String,
    #[serde(rename = "type")]
    pub fact_type: FactType,
    pub values: Vec<FactValue>,
    pub description: String,
    #[serde(default)]
    pub source: FactSource,
}

impl FactMeta {
    pub fn boolean(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fact_type: FactType::Boolean,
            values: vec![FactValue::Bool(true), FactValue::Bool(false), FactValue::Null],
            description: description.into(),
            source: FactSource::Core,
        }
    }

    pub fn string<I, S>(label: impl Into<String>, values: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut domain: Vec<FactValue> =
            values.into_iter().map(|value| FactValue::Text(value.into())).collect();
        domain.push(FactValue::Null);

        Self {
            label: label.into(),
            fact_type: FactType::String,
            values: domain,
            description: description.into(),
            source: FactSource::Core,
        }
    }

    pub fn custom(definition: &FactDefinition) -> Self {
        Self {
            source: FactSource::Custom,
            ..Self::boolean(
                definition.name.clone(),
                format!("Fact personalizado ({})", definition.derivation.as_str()),
            )
        }
    }

    fn accepts(&self, value: &FactValue) -> bool {
        match (self.fact_type, value) {
            (_, FactValue::Null) => true,
            (FactType::Boolean, FactValue::Bool(_)) => true,
            (FactType::String, FactValue::Text(_)) => {
                let enumerated = self.values.iter().any(|allowed| !allowed.is_null());
                !enumerated || self.values.contains(value)
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GuardBuildError {
    #[error("fact `{0}` is not defined for this agent")]
    UnknownFact(String),
    #[error("fact `{fact}` is {expected} and cannot be compared with {found}")]
    TypeMismatch { fact: String, expected: FactType, found: String },
    #[error("value {value} is outside the domain of fact `{fact}`")]
    OutOfDomain { fact: String, value: String },
}

/// Lookup table of every fact a guard may reference for one agent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactRegistry {
    facts: BTreeMap<String, FactMeta>,
    overridden: Vec<String>,
}

/// Merges the core fact table with an agent's custom facts.
///
/// A custom fact named like a core fact replaces it. The replacement is kept
/// (see [`FactRegistry::overridden_core_facts`]) and logged, never rejected here.
pub fn get_available_facts(custom_facts: &[FactDefinition]) -> FactRegistry {
    let mut registry = FactRegistry::core();

    for definition in custom_facts {
        let previous = registry.insert(definition.name.clone(), FactMeta::custom(definition));
        match previous.map(|meta| meta.source) {
            Some(FactSource::Core) => {
                tracing::warn!(
                    event_name = "facts.registry.core_override",
                    fact = %definition.name,
                    derivation = definition.derivation.as_str(),
                    "custom fact replaces core fact"
                );
                registry.overridden.push(definition.name.clone());
            }
            Some(FactSource::Custom) => {
                tracing::debug!(
                    event_name = "facts.registry.duplicate_custom",
                    fact = %definition.name,
                    "custom fact defined more than once; last definition wins"
                );
            }
            None => {}
        }
    }

    registry
}

impl FactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn core() -> Self {
        Self { facts: core_facts(), overridden: Vec::new() }
    }

    pub fn with_fact(mut self, key: impl Into<String>, meta: FactMeta) -> Self {
        self.insert(key, meta);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, meta: FactMeta) -> Option<FactMeta> {
        self.facts.insert(key.into(), meta)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&FactMeta> {
        self.facts.get(key)
    }

    /// Display label for a fact, falling back to the raw key.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.facts.get(key).map(|meta| meta.label.as_str()).unwrap_or(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FactMeta)> {
        self.facts.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<String, FactMeta> {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn overridden_core_facts(&self) -> &[String] {
        &self.overridden
    }

    pub fn checked_eq(
        &self,
        key: impl Into<String>,
        value: impl Into<FactValue>,
    ) -> Result<GuardExpression, GuardBuildError> {
        let (key, value) = self.check_comparison(key.into(), value.into())?;
        Ok(GuardExpression::Eq(key, value))
    }

    pub fn checked_neq(
        &self,
        key: impl Into<String>,
        value: impl Into<FactValue>,
    ) -> Result<GuardExpression, GuardBuildError> {
        let (key, value) = self.check_comparison(key.into(), value.into())?;
        Ok(GuardExpression::Neq(key, value))
    }

    pub fn checked_exists(&self, key: impl Into<String>) -> Result<GuardExpression, GuardBuildError> {
        let key = key.into();
        if !self.contains(&key) {
            return Err(GuardBuildError::UnknownFact(key));
        }
        Ok(GuardExpression::Exists(key))
    }

    fn check_comparison(
        &self,
        key: String,
        value: FactValue,
    ) -> Result<(String, FactValue), GuardBuildError> {
        let Some(meta) = self.facts.get(&key) else {
            return Err(GuardBuildError::UnknownFact(key));
        };

        if meta.accepts(&value) {
            return Ok((key, value));
        }

        let rendered = value.to_json().to_string();
        let type_matches = matches!(
            (meta.fact_type, &value),
            (FactType::String, FactValue::Text(_)) | (FactType::Boolean, FactValue::Bool(_))
        );
        if type_matches {
            Err(GuardBuildError::OutOfDomain { fact: key, value: rendered })
        } else {
            Err(GuardBuildError::TypeMismatch { fact: key, expected: meta.fact_type, found: rendered })
        }
    }
}
