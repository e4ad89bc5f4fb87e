use std::path::{Path, PathBuf};

use leadguard_core::audit::{AuditContext, TracingAuditSink};
use leadguard_core::config::AppConfig;
use leadguard_core::guard::{translate_guard_json, ROOT_PATH};
use serde::Serialize;

use crate::commands::{load_agent, read_json, registry_for, CommandResult};

const COMMAND: &str = "validate";

#[derive(Clone, Debug)]
pub enum Target {
    Agent(PathBuf),
    Guard { guard: PathBuf, facts_from: Option<PathBuf> },
}

#[derive(Debug, Serialize)]
struct GuardReport {
    valid: bool,
    errors: Vec<String>,
    summary: String,
}

pub fn run(config: &AppConfig, target: &Target) -> CommandResult {
    match target {
        Target::Agent(path) => validate_agent(config, path),
        Target::Guard { guard, facts_from } => validate_guard(config, guard, facts_from.as_deref()),
    }
}

fn validate_agent(config: &AppConfig, path: &Path) -> CommandResult {
    let agent = match load_agent(path) {
        Ok(agent) => agent,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };
    let registry = registry_for(config, Some(&agent));
    let audit = AuditContext::new(
        Some(agent.id.clone()),
        None,
        format!("cli-validate-{}", agent.id.0),
        "leadguard-cli",
    );
    let report = agent.validate_with_audit(
        &registry,
        &config.agent_validation_options(),
        &TracingAuditSink,
        &audit,
    );

    let problems = report.issues.len()
        + report.priorities.iter().map(|priority| priority.errors.len()).sum::<usize>();

    tracing::info!(
        event_name = "cli.validate.agent",
        agent_id = %agent.id.0,
        valid = report.valid,
        problems,
        "agent validated"
    );

    if report.valid {
        CommandResult::success_with_data(
            COMMAND,
            format!("agent `{}`: {} priorities valid", agent.id.0, report.priorities.len()),
            &report,
        )
    } else {
        CommandResult::failure_with_data(
            COMMAND,
            "guard_invalid",
            format!("agent `{}`: {problems} problem(s) found", agent.id.0),
            1,
            &report,
        )
    }
}

fn validate_guard(config: &AppConfig, guard_path: &Path, facts_from: Option<&Path>) -> CommandResult {
    let agent = match facts_from.map(load_agent).transpose() {
        Ok(agent) => agent,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };
    let guard = match read_json(guard_path) {
        Ok(guard) => guard,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };
    let registry = registry_for(config, agent.as_ref());

    let validation = config.guard_validator().validate_json(Some(&guard), ROOT_PATH, &registry);
    let report = GuardReport {
        valid: validation.valid,
        summary: translate_guard_json(Some(&guard), &registry),
        errors: validation.errors,
    };

    if report.valid {
        CommandResult::success_with_data(COMMAND, "guard is valid", &report)
    } else {
        CommandResult::failure_with_data(
            COMMAND,
            "guard_invalid",
            format!("{} problem(s) found", report.errors.len()),
            1,
            &report,
        )
    }
}
