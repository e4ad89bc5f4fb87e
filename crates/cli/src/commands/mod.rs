pub mod config;
pub mod evaluate;
pub mod facts;
pub mod translate;
pub mod validate;

use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use leadguard_core::config::AppConfig;
use leadguard_core::domain::agent::AgentConfig;
use leadguard_core::errors::{ApplicationError, DomainError};
use leadguard_core::facts::{FactRegistry, FactRegistryCache};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::build(command, None, message.into(), 0, None)
    }

    pub fn success_with_data<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: &T,
    ) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::build(command, None, message.into(), 0, Some(data)),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::build(command, Some(error_class), message.into(), exit_code, None)
    }

    pub fn failure_with_data<T: Serialize>(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: &T,
    ) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::build(command, Some(error_class), message.into(), exit_code, Some(data)),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }

    /// Plain human-readable output with a zero exit code.
    pub fn text(output: String) -> Self {
        Self { exit_code: 0, output }
    }

    /// Maps a boundary error onto the envelope. IO problems are environment
    /// failures (exit 2); anything else is bad input (exit 1).
    pub fn from_error(command: &str, error: &anyhow::Error) -> Self {
        let message = format!("{error:#}");

        if let Some(domain) = error.chain().find_map(|cause| cause.downcast_ref::<DomainError>()) {
            let application = ApplicationError::from(domain.clone());
            return Self::failure(
                command,
                application.error_class(),
                message,
                application.exit_code(),
            );
        }

        if error.chain().any(|cause| cause.is::<std::io::Error>()) {
            return Self::failure(command, "io", message, 2);
        }

        Self::failure(command, "input", message, 1)
    }

    fn build(
        command: &str,
        error_class: Option<&str>,
        message: String,
        exit_code: u8,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: if error_class.is_none() { "ok" } else { "error" }.to_string(),
            error_class: error_class.map(str::to_string),
            message,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read `{}`", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("`{}` is not valid JSON", path.display()))
}

pub(crate) fn load_agent(path: &Path) -> anyhow::Result<AgentConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read agent document `{}`", path.display()))?;
    let agent = AgentConfig::from_json_str(&raw)
        .with_context(|| format!("could not load agent document `{}`", path.display()))?;

    tracing::debug!(
        event_name = "cli.agent.loaded",
        agent_id = %agent.id.0,
        fact_definitions = agent.orchestration.fact_definitions.len(),
        priorities = agent.orchestration.priorities.len(),
        "agent document loaded"
    );
    Ok(agent)
}

/// Effective registry for an agent, memoized per agent id when
/// `registry.cache_enabled` is set.
pub(crate) fn registry_for(config: &AppConfig, agent: Option<&AgentConfig>) -> Arc<FactRegistry> {
    static REGISTRY_CACHE: OnceLock<FactRegistryCache> = OnceLock::new();

    match agent {
        None => Arc::new(FactRegistry::core()),
        Some(agent) if config.registry.cache_enabled => REGISTRY_CACHE
            .get_or_init(FactRegistryCache::new)
            .get_or_build(&agent.id.0, &agent.orchestration.fact_definitions),
        Some(agent) => Arc::new(agent.registry()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::CommandResult;
    use leadguard_core::errors::DomainError;

    fn payload(result: &CommandResult) -> Value {
        serde_json::from_str(&result.output).expect("envelope should be JSON")
    }

    #[test]
    fn success_envelope_omits_empty_data() {
        let result = CommandResult::success("facts", "8 facts available");
        let payload = payload(&result);

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["status"], "ok");
        assert!(payload["error_class"].is_null());
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn data_is_attached_to_failures() {
        let result = CommandResult::failure_with_data(
            "validate",
            "guard_invalid",
            "1 problem",
            1,
            &json!({ "errors": ["root: must have at least one valid operator"] }),
        );
        let payload = payload(&result);

        assert_eq!(result.exit_code, 1);
        assert_eq!(payload["error_class"], "guard_invalid");
        assert_eq!(payload["data"]["errors"][0], "root: must have at least one valid operator");
    }

    #[test]
    fn boundary_errors_map_to_classes() {
        let io = anyhow::Error::new(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
            .context("could not read `agent.json`");
        let result = CommandResult::from_error("facts", &io);
        assert_eq!(result.exit_code, 2);
        assert_eq!(payload(&result)["error_class"], "io");

        let domain = anyhow::Error::new(DomainError::InvalidDocument("missing field `id`".into()));
        let result = CommandResult::from_error("facts", &domain);
        assert_eq!(result.exit_code, 1);
        assert_eq!(payload(&result)["error_class"], "document_invalid");

        let other = anyhow::anyhow!("state document must be an object");
        assert_eq!(payload(&CommandResult::from_error("evaluate", &other))["error_class"], "input");
    }
}
