use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DomainError;
use crate::guard::{create_empty_guard, GuardExpression, GuardParseError};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriorityId(pub String);

/// Editor state of a priority's guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    /// No guard: the priority is always eligible.
    None,
    Configuring,
}

/// A goal the agent may pursue. The guard is kept in its stored JSON form and
/// only converted to [`GuardExpression`] once it validates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Priority {
    pub id: PriorityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Value>,
}

impl Priority {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: PriorityId(id.into()), name: name.into(), description: None, guard: None }
    }

    pub fn with_guard(mut self, guard: GuardExpression) -> Self {
        self.set_guard(Some(guard));
        self
    }

    pub fn guard_mode(&self) -> GuardMode {
        match self.guard {
            None | Some(Value::Null) => GuardMode::None,
            Some(_) => GuardMode::Configuring,
        }
    }

    pub fn guard_expression(&self) -> Result<Option<GuardExpression>, GuardParseError> {
        match &self.guard {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => GuardExpression::from_json(raw).map(Some),
        }
    }

    pub fn set_guard(&mut self, guard: Option<GuardExpression>) {
        self.guard = guard.map(|expression| expression.to_json());
    }

    /// Moves between "no guard" and "configuring". Entering configuration
    /// starts from an empty guard; leaving it discards the tree.
    pub fn transition_guard(&mut self, next: GuardMode) -> Result<(), DomainError> {
        match (self.guard_mode(), next) {
            (GuardMode::None, GuardMode::Configuring) => {
                self.set_guard(Some(create_empty_guard()));
                Ok(())
            }
            (GuardMode::Configuring, GuardMode::None) => {
                self.guard = None;
                Ok(())
            }
            (from, to) => Err(DomainError::InvalidGuardTransition { from, to }),
        }
    }
}
