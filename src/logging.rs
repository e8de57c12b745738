//! Logging configuration for the sync core.
//!
//! Provides console and optional file output on top of `tracing`.

use std::fs::{self, File};
use std::path::PathBuf;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{LoggingError, LoggingResult};

/// Name of the log file written inside the configured directory.
const LOG_FILE_NAME: &str = "ucp-sync.log";

/// Guard that must be kept alive to ensure log flushing on shutdown.
///
/// When this guard is dropped, buffered log entries are flushed.
#[derive(Debug)]
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

/// Configuration for logging output.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter. If `None`, falls back to `RUST_LOG` or INFO.
    pub level: Option<LevelFilter>,
    /// Whether to output logs to console (stderr).
    pub console: bool,
    /// Optional directory for file output.
    pub log_dir: Option<PathBuf>,
}

/// Initialize console-only logging with the given level.
pub fn init_console_logging(level: LevelFilter) -> LoggingResult<LoggingGuard> {
    init_logging(LoggingConfig {
        level: Some(level),
        console: true,
        log_dir: None,
    })
}

/// Initialize logging with the given configuration.
///
/// Returns a [`LoggingGuard`] that must be kept alive for the duration of the
/// application. If neither console nor file output is enabled, logging is
/// disabled (tracing macros become no-ops) and `Ok` is returned.
pub fn init_logging(config: LoggingConfig) -> LoggingResult<LoggingGuard> {
    if !config.console && config.log_dir.is_none() {
        return Ok(LoggingGuard {
            _worker_guard: None,
        });
    }

    let env_filter = match config.level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LevelFilter::INFO.to_string())),
    };

    let (file_layer, guard) = if let Some(log_dir) = &config.log_dir {
        fs::create_dir_all(log_dir)?;
        let file = File::create(log_dir.join(LOG_FILE_NAME))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = fmt::layer().with_target(true).with_ansi(false).with_writer(non_blocking);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let console_layer = config.console.then(|| fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard {
        _worker_guard: guard,
    })
}
