use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::guard::FactValue;

static UNKNOWN: FactValue = FactValue::Null;

/// Live fact values for one conversation, as seen by guard evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSnapshot {
    values: BTreeMap<String, FactValue>,
}

impl FactSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FactValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FactValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.values.get(key)
    }

    /// Value of a fact, with missing facts reading as `null`.
    pub fn value_of(&self, key: &str) -> &FactValue {
        self.values.get(key).unwrap_or(&UNKNOWN)
    }

    pub fn is_true(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(FactValue::Bool(true)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FactValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
