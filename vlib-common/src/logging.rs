//! Tracing initialisation shared by vlib binaries

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the event filter: `RUST_LOG` wins, otherwise the configured level
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global tracing subscriber (fmt layer on stderr)
///
/// Stdout stays reserved for command output.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialise tracing: {}", e)))
}
