use std::path::Path;

use leadguard_core::config::AppConfig;
use leadguard_core::facts::{FactMeta, FactRegistry, FactSource};
use leadguard_core::guard::FactValue;

use crate::commands::{load_agent, registry_for, CommandResult};

const COMMAND: &str = "facts";

pub fn run(config: &AppConfig, agent_path: Option<&Path>, json_output: bool) -> CommandResult {
    let agent = match agent_path.map(load_agent).transpose() {
        Ok(agent) => agent,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };
    let registry = registry_for(config, agent.as_ref());

    if json_output {
        return CommandResult::success_with_data(
            COMMAND,
            format!("{} facts available", registry.len()),
            registry.as_map(),
        );
    }

    CommandResult::text(render_human(&registry))
}

fn render_human(registry: &FactRegistry) -> String {
    let mut lines = vec![format!("available facts ({}):", registry.len())];
    for (key, meta) in registry.iter() {
        lines.push(render_fact(key, meta));
    }
    for key in registry.overridden_core_facts() {
        lines.push(format!("! custom fact `{key}` replaces the core fact of the same name"));
    }
    lines.join("\n")
}

fn render_fact(key: &str, meta: &FactMeta) -> String {
    let source = match meta.source {
        FactSource::Core => "core",
        FactSource::Custom => "custom",
    };
    let values: Vec<String> = meta.values.iter().map(render_value).collect();
    format!("- {key} [{source}, {}] \"{}\" values: {}", meta.fact_type, meta.label, values.join(" | "))
}

fn render_value(value: &FactValue) -> String {
    match value {
        FactValue::Null => "null".to_string(),
        FactValue::Bool(flag) => flag.to_string(),
        FactValue::Text(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use leadguard_core::facts::FactRegistry;

    use super::render_human;

    #[test]
    fn human_listing_includes_every_core_fact() {
        let output = render_human(&FactRegistry::core());

        assert!(output.starts_with("available facts (8):"));
        assert!(output.contains("- operation_type [core, string]"));
        assert!(output.contains("RENT | SELL | null"));
        assert!(output.contains("- has_contact [core, boolean]"));
        assert!(!output.contains('!'));
    }
}
