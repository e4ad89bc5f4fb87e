use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use leadguard_core::config::{resolve_config_path, AppConfig};
use toml::Value;

struct Field<'a> {
    key_path: &'a str,
    value: String,
    env_keys: &'a [&'a str],
}

pub fn run(config: &AppConfig, explicit_path: Option<&Path>) -> String {
    let config_file_path = resolve_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["LEADGUARD_LOGGING_LEVEL", "LEADGUARD_LOG_LEVEL"],
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["LEADGUARD_LOGGING_FORMAT", "LEADGUARD_LOG_FORMAT"],
        },
        Field {
            key_path: "guards.max_depth",
            value: config.guards.max_depth.to_string(),
            env_keys: &["LEADGUARD_GUARDS_MAX_DEPTH"],
        },
        Field {
            key_path: "registry.reject_core_overrides",
            value: config.registry.reject_core_overrides.to_string(),
            env_keys: &["LEADGUARD_REGISTRY_REJECT_CORE_OVERRIDES"],
        },
        Field {
            key_path: "registry.cache_enabled",
            value: config.registry.cache_enabled.to_string(),
            env_keys: &["LEADGUARD_REGISTRY_CACHE_ENABLED"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config file"));
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
