use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// `RUST_LOG` wins; otherwise the configured level, falling back to `info`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Log to a JSON file so output does not interfere with the TUI.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let log_file = std::fs::File::create(&config.file)
        .with_context(|| format!("failed to create log file {}", config.file))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .json()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    tracing::info!(file = %config.file, level = %config.level, "Logger initialized");
    Ok(())
}
