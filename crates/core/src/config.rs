use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::agent::AgentValidationOptions;
use crate::guard::{GuardValidator, DEFAULT_MAX_DEPTH};

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["leadguard.toml", "config/leadguard.toml"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub guards: GuardsConfig,
    pub registry: RegistryConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardsConfig {
    pub max_depth: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    pub reject_core_overrides: bool,
    pub cache_enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub max_depth: Option<usize>,
    pub reject_core_overrides: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            guards: GuardsConfig { max_depth: DEFAULT_MAX_DEPTH },
            registry: RegistryConfig { reject_core_overrides: false, cache_enabled: true },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn guard_validator(&self) -> GuardValidator {
        GuardValidator::new(self.guards.max_depth)
    }

    pub fn agent_validation_options(&self) -> AgentValidationOptions {
        AgentValidationOptions {
            validator: self.guard_validator(),
            reject_core_overrides: self.registry.reject_core_overrides,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(guards) = patch.guards {
            if let Some(max_depth) = guards.max_depth {
                self.guards.max_depth = max_depth;
            }
        }

        if let Some(registry) = patch.registry {
            if let Some(reject_core_overrides) = registry.reject_core_overrides {
                self.registry.reject_core_overrides = reject_core_overrides;
            }
            if let Some(cache_enabled) = registry.cache_enabled {
                self.registry.cache_enabled = cache_enabled;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let log_level =
            read_env("LEADGUARD_LOGGING_LEVEL").or_else(|| read_env("LEADGUARD_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LEADGUARD_LOGGING_FORMAT").or_else(|| read_env("LEADGUARD_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("LEADGUARD_GUARDS_MAX_DEPTH") {
            self.guards.max_depth = parse_usize("LEADGUARD_GUARDS_MAX_DEPTH", &value)?;
        }

        if let Some(value) = read_env("LEADGUARD_REGISTRY_REJECT_CORE_OVERRIDES") {
            self.registry.reject_core_overrides =
                parse_bool("LEADGUARD_REGISTRY_REJECT_CORE_OVERRIDES", &value)?;
        }
        if let Some(value) = read_env("LEADGUARD_REGISTRY_CACHE_ENABLED") {
            self.registry.cache_enabled = parse_bool("LEADGUARD_REGISTRY_CACHE_ENABLED", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(max_depth) = overrides.max_depth {
            self.guards.max_depth = max_depth;
        }
        if let Some(reject_core_overrides) = overrides.reject_core_overrides {
            self.registry.reject_core_overrides = reject_core_overrides;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_logging(&self.logging)?;
        validate_guards(&self.guards)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_guards(guards: &GuardsConfig) -> Result<(), ConfigError> {
    if guards.max_depth == 0 || guards.max_depth > 512 {
        return Err(ConfigError::Validation(
            "guards.max_depth must be in range 1..=512".to_string(),
        ));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    guards: Option<GuardsPatch>,
    registry: Option<RegistryPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct GuardsPatch {
    max_depth: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryPatch {
    reject_core_overrides: Option<bool>,
    cache_enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ENV_VARS: [&str; 7] = [
        "LEADGUARD_LOGGING_LEVEL",
        "LEADGUARD_LOG_LEVEL",
        "LEADGUARD_LOGGING_FORMAT",
        "LEADGUARD_LOG_FORMAT",
        "LEADGUARD_GUARDS_MAX_DEPTH",
        "LEADGUARD_REGISTRY_REJECT_CORE_OVERRIDES",
        "LEADGUARD_REGISTRY_CACHE_ENABLED",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_load_without_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let config = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config == AppConfig::default(), "defaults should apply without a file")?;
        ensure(config.guard_validator().max_depth() == 64, "default depth should be 64")?;
        ensure(
            !config.agent_validation_options().reject_core_overrides,
            "core overrides should be allowed by default",
        )
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let result = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "require_file should fail when the file is absent",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);

        env::set_var("TEST_LEADGUARD_LOG_LEVEL", "debug");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("leadguard.toml");
            fs::write(
                &path,
                r#"
[logging]
level = "${TEST_LEADGUARD_LOG_LEVEL}"

[guards]
max_depth = 12

[registry]
reject_core_overrides = true
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "debug", "level should be interpolated from env")?;
            ensure(config.guards.max_depth == 12, "max depth should be read from file")?;
            ensure(config.registry.reject_core_overrides, "registry flag should be read from file")?;
            ensure(config.registry.cache_enabled, "cache flag should keep its default")?;
            Ok(())
        })();

        clear_vars(&["TEST_LEADGUARD_LOG_LEVEL"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);

        env::set_var("LEADGUARD_GUARDS_MAX_DEPTH", "20");
        env::set_var("LEADGUARD_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("leadguard.toml");
            fs::write(
                &path,
                r#"
[logging]
level = "warn"
format = "pretty"

[guards]
max_depth = 8
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("error".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "error", "override log level should win")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "env log format should win over file",
            )?;
            ensure(config.guards.max_depth == 20, "env max depth should win over file")?;
            Ok(())
        })();

        clear_vars(&ENV_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);

        env::set_var("LEADGUARD_GUARDS_MAX_DEPTH", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("guards.max_depth")
            );
            ensure(has_message, "validation failure should mention guards.max_depth")
        })();

        clear_vars(&ENV_VARS);
        result
    }

    #[test]
    fn malformed_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);

        env::set_var("LEADGUARD_REGISTRY_CACHE_ENABLED", "sometimes");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default());
            ensure(
                matches!(
                    error,
                    Err(ConfigError::InvalidEnvOverride { ref key, .. })
                        if key == "LEADGUARD_REGISTRY_CACHE_ENABLED"
                ),
                "invalid boolean should be reported with its key",
            )
        })();

        clear_vars(&ENV_VARS);
        result
    }
}
