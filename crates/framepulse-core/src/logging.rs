//! Logging configuration using tracing

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter.
pub const LOG_ENV_VAR: &str = "FRAMEPULSE_LOG";

const LOG_FILE_NAME: &str = "framepulse.log";

/// Initialize the logging subsystem
///
/// Logs are written to `<log_dir>/framepulse.log` with daily rotation.
/// Log level is controlled by the `FRAMEPULSE_LOG` environment variable.
///
/// # Examples
/// ```bash
/// FRAMEPULSE_LOG=debug framepulse bench
/// FRAMEPULSE_LOG=trace framepulse live --frames 600
/// ```
pub fn init(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);

    // Default to info, allow override via FRAMEPULSE_LOG
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new("framepulse=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("framepulse starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Default data directory (`<local data>/framepulse`), falling back to `.`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("framepulse")
}

/// Log directory beneath a data directory.
pub fn log_directory(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}
