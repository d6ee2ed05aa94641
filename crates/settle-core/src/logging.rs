//! Logging configuration using tracing
//!
//! Diagnostics go to a daily rolling file so stdout and stderr stay reserved
//! for the wait result or NDJSON events.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "SETTLE_LOG";

/// Environment variable overriding the log directory
pub const LOG_DIR_ENV_VAR: &str = "SETTLE_LOG_DIR";

const LOG_FILE_PREFIX: &str = "settle.log";

const DEFAULT_FILTER: &str = "settle=info,settle_core=info,settle_device=info,warn";

/// Where logs go and how verbose they are
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub filter: String,
}

impl LogConfig {
    /// Resolve from `SETTLE_LOG` and `SETTLE_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var(LOG_ENV_VAR).ok(),
            std::env::var_os(LOG_DIR_ENV_VAR).map(PathBuf::from),
        )
    }

    /// Blank or unparsable filters fall back to the default filter.
    fn resolve(filter: Option<String>, dir: Option<PathBuf>) -> Self {
        let filter = filter
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty() && EnvFilter::try_new(f).is_ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self {
            dir: dir.unwrap_or_else(default_log_dir),
            filter,
        }
    }

    /// `SETTLE_LOG=off` skips file logging without touching the disk.
    pub fn is_disabled(&self) -> bool {
        self.filter.eq_ignore_ascii_case("off")
    }

    /// Today's log file. The appender rolls over at UTC midnight.
    pub fn current_file(&self) -> PathBuf {
        let date = chrono::Utc::now().format("%Y-%m-%d");
        self.dir.join(format!("{LOG_FILE_PREFIX}.{date}"))
    }
}

/// Initialize logging from the environment
///
/// Returns the file being written, or `None` when logging is off.
///
/// # Examples
/// ```bash
/// SETTLE_LOG=debug settle --pattern '.*onResume'
/// SETTLE_LOG_DIR=/tmp/settle SETTLE_LOG=trace settle --pattern '.*onResume'
/// ```
pub fn init() -> Result<Option<PathBuf>> {
    init_with(&LogConfig::from_env())
}

/// Initialize logging with an explicit config
pub fn init_with(config: &LogConfig) -> Result<Option<PathBuf>> {
    if config.is_disabled() {
        return Ok(None);
    }

    std::fs::create_dir_all(&config.dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(&config.dir)
        .map_err(|e| Error::config(format!("Failed to open log file: {}", e)))?;

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.filter))
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
        .try_init()
        .map_err(|e| Error::config(format!("Logging already initialized: {}", e)))?;

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("settle {} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log directory: {}", config.dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(Some(config.current_file()))
}

fn default_log_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("settle").join("logs")
}
