use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use std::path::Path;

/// Initialize logging system
///
/// `RUST_LOG` overrides `level`. Fails if the log file cannot be opened or a
/// global subscriber is already installed.
pub fn init_logger(level: &str, json_output: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if json_output {
        // JSON formatting for production
        if let Some(file) = log_file {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)?;

            registry
                .with(fmt::layer().json().with_writer(file))
                .try_init()?;
        } else {
            registry
                .with(fmt::layer().json())
                .try_init()?;
        }
    } else {
        // Pretty formatting for development
        registry
            .with(fmt::layer().with_target(false))
            .try_init()?;
    }

    Ok(())
}

/// Initialize logger from config
pub fn init_from_config(config: &crate::utils::config::LoggingConfig) -> anyhow::Result<()> {
    let json = config.output == "json";
    let log_file = if !config.file_path.is_empty() {
        Some(Path::new(&config.file_path))
    } else {
        None
    };

    init_logger(&config.level, json, log_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let config = crate::utils::config::LoggingConfig::default();
        let first = init_from_config(&config);
        let second = init_from_config(&config);
        // another test may have installed a subscriber first
        assert!(first.is_ok() || second.is_err());
        assert!(second.is_err());
    }
}
