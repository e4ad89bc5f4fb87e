pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use leadguard_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "leadguard",
    about = "Leadguard guard-expression CLI",
    long_about = "Inspect fact registries, validate and translate priority guards, and evaluate agent eligibility from JSON files.",
    after_help = "Examples:\n  leadguard facts --agent agent.json\n  leadguard validate --guard guard.json --facts-from agent.json\n  leadguard evaluate --agent agent.json --state state.json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a leadguard.toml file (must exist when given)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level for this run")]
    log_level: Option<String>,
    #[arg(long, global = true, value_parser = parse_log_format, help = "Override logging.format (compact|pretty|json)")]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List the facts available to guards (core facts plus an agent's custom facts)")]
    Facts {
        #[arg(long, help = "Agent document whose custom facts are merged in")]
        agent: Option<PathBuf>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Validate every priority guard of an agent, or a single guard file")]
    Validate {
        #[arg(long, conflicts_with = "guard", required_unless_present = "guard")]
        agent: Option<PathBuf>,
        #[arg(long)]
        guard: Option<PathBuf>,
        #[arg(long, requires = "guard", help = "Agent document providing custom facts for --guard")]
        facts_from: Option<PathBuf>,
    },
    #[command(about = "Render a guard as a Spanish summary")]
    Translate {
        #[arg(long)]
        guard: PathBuf,
        #[arg(long, help = "Agent document providing custom fact labels")]
        agent: Option<PathBuf>,
    },
    #[command(about = "Derive custom facts from a conversation state and list eligible priorities")]
    Evaluate {
        #[arg(long)]
        agent: PathBuf,
        #[arg(long, help = "State document: { \"facts\": {...}, \"fields\": {...} }")]
        state: PathBuf,
        #[arg(long, help = "Conversation id attached to audit events")]
        conversation: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Facts { .. } => "facts",
            Self::Validate { .. } => "validate",
            Self::Translate { .. } => "translate",
            Self::Evaluate { .. } => "evaluate",
            Self::Config => "config",
        }
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse::<LogFormat>().map_err(|error| error.to_string())
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides: ConfigOverrides {
            log_level: cli.log_level.clone(),
            log_format: cli.log_format,
            ..ConfigOverrides::default()
        },
    };

    let result = match AppConfig::load(options) {
        Ok(config) => {
            logging::init(&config);
            dispatch(cli.command, &config, cli.config.as_deref())
        }
        Err(error) => CommandResult::failure(
            cli.command.name(),
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        ),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn dispatch(
    command: Command,
    config: &AppConfig,
    config_path: Option<&std::path::Path>,
) -> CommandResult {
    match command {
        Command::Facts { agent, json } => commands::facts::run(config, agent.as_deref(), json),
        Command::Validate { agent, guard, facts_from } => {
            let target = match (agent, guard) {
                (Some(agent), _) => commands::validate::Target::Agent(agent),
                (None, Some(guard)) => commands::validate::Target::Guard { guard, facts_from },
                (None, None) => {
                    return CommandResult::failure(
                        "validate",
                        "input",
                        "either --agent or --guard is required",
                        1,
                    )
                }
            };
            commands::validate::run(config, &target)
        }
        Command::Translate { guard, agent } => {
            commands::translate::run(config, &guard, agent.as_deref())
        }
        Command::Evaluate { agent, state, conversation } => {
            commands::evaluate::run(config, &agent, &state, conversation)
        }
        Command::Config => CommandResult::text(commands::config::run(config, config_path)),
    }
}
