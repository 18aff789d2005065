//! Logging setup using tracing.
//!
//! Logs go to stderr so that report output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|e| {
            eprintln!("Invalid log level '{}': {e}, using info", config.level);
            EnvFilter::new("info")
        });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder
            .json()
            .with_target(true)
            .flatten_event(true)
            .try_init(),
        LogFormat::Text => builder.with_target(false).try_init(),
    };

    if result.is_ok() {
        tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    }
}
