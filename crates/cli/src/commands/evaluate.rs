use std::path::Path;

use anyhow::Context;
use leadguard_core::audit::{AuditContext, TracingAuditSink};
use leadguard_core::config::AppConfig;
use leadguard_core::eligibility::{EligibilityEngine, PriorityDecision};
use leadguard_core::facts::{FactResolver, FactSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commands::{load_agent, read_json, registry_for, CommandResult};

const COMMAND: &str = "evaluate";

/// Conversation state as exported by the runtime: fact values already known
/// plus the raw lead fields custom facts are derived from.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConversationState {
    #[serde(default)]
    facts: FactSnapshot,
    #[serde(default)]
    fields: Value,
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    facts: FactSnapshot,
    eligible: Vec<String>,
    decisions: Vec<PriorityDecision>,
}

pub fn run(
    config: &AppConfig,
    agent_path: &Path,
    state_path: &Path,
    conversation_id: Option<String>,
) -> CommandResult {
    match evaluate(config, agent_path, state_path, conversation_id) {
        Ok(report) => CommandResult::success_with_data(
            COMMAND,
            format!(
                "{} of {} priorities eligible",
                report.eligible.len(),
                report.decisions.len()
            ),
            &report,
        ),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn evaluate(
    config: &AppConfig,
    agent_path: &Path,
    state_path: &Path,
    conversation_id: Option<String>,
) -> anyhow::Result<EvaluationReport> {
    let agent = load_agent(agent_path)?;
    let state: ConversationState = serde_json::from_value(read_json(state_path)?)
        .with_context(|| format!("`{}` is not a valid state document", state_path.display()))?;

    let registry = registry_for(config, Some(&agent));
    let facts = FactResolver::new().resolve(
        &agent.orchestration.fact_definitions,
        state.facts,
        &state.fields,
    );

    let audit = AuditContext::new(
        Some(agent.id.clone()),
        conversation_id,
        format!("cli-evaluate-{}", agent.id.0),
        "leadguard-cli",
    );
    let decisions = EligibilityEngine::new(config.guard_validator()).evaluate_with_audit(
        &agent,
        &registry,
        &facts,
        &TracingAuditSink,
        &audit,
    );
    let eligible = decisions
        .iter()
        .filter(|decision| decision.eligible)
        .map(|decision| decision.priority_id.0.clone())
        .collect();

    Ok(EvaluationReport { facts, eligible, decisions })
}
