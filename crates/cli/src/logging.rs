use leadguard_core::config::{AppConfig, LogFormat};
use tracing::Level;

/// Installs the global subscriber. Output goes to stderr; stdout carries
/// command payloads only.
pub fn init(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when commands run in-process.
    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_err() {
        tracing::debug!(event_name = "cli.logging.already_initialized", "subscriber already set");
    }
}

#[cfg(test)]
mod tests {
    use leadguard_core::config::{AppConfig, LogFormat};

    use super::init;

    #[test]
    fn json_subscriber_installs_once_and_tolerates_reinit() {
        let mut config = AppConfig::default();
        config.logging.format = LogFormat::Json;
        config.logging.level = "not-a-level".to_string();

        init(&config);
        init(&config);

        tracing::info!(event_name = "cli.logging.test", "subscriber accepts events");
    }
}
