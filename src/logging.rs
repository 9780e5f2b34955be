//! Logging setup: stderr, plus a rotating file when a log directory is set.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::ConfigError;

const LOG_FILE_PREFIX: &str = "freelance-hub";
const LOG_RETENTION_DAYS: usize = 7;

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init(log_dir: Option<&Path>) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(LOG_RETENTION_DAYS)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| ConfigError::InvalidValue {
                    key: "FREELANCE_HUB_LOG_DIR".to_string(),
                    message: e.to_string(),
                })?;
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(appender),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}
