//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::LoggingConfig;
use crate::types::error::{Error, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set. Calling this
/// twice is an error, which tests avoid by never installing one.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("linkpage={0},tower_http={0}", config.level)))
        .map_err(|e| Error::config(format!("Invalid log filter: {}", e)))?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };

    installed.map_err(|e| Error::internal(format!("Failed to install logger: {}", e)))
}
