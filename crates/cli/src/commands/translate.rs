use std::path::Path;

use leadguard_core::config::AppConfig;
use leadguard_core::guard::translate_guard_json;

use crate::commands::{load_agent, read_json, registry_for, CommandResult};

const COMMAND: &str = "translate";

/// Prints the Spanish summary. Translation is best-effort; invalid guards
/// still render, with malformed nodes shown as "Condición desconocida".
pub fn run(config: &AppConfig, guard_path: &Path, agent_path: Option<&Path>) -> CommandResult {
    let agent = match agent_path.map(load_agent).transpose() {
        Ok(agent) => agent,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };
    let guard = match read_json(guard_path) {
        Ok(guard) => guard,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let registry = registry_for(config, agent.as_ref());
    CommandResult::text(translate_guard_json(Some(&guard), &registry))
}
