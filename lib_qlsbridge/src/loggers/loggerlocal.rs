use std::path::{Path, PathBuf};

use chrono::Local;
use glob::glob;
use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Errors raised while installing the process logger.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid log file pattern: {0}")]
    PatternError(#[from] glob::PatternError),

    #[error("Invalid log filter '{0}'")]
    FilterError(String),

    #[error("A global logger is already installed: {0}")]
    InitError(String),
}

/// # Logger Local Options
///
/// Controls where and how log messages are written.
#[derive(Debug, Clone)]
pub struct LoggerLocalOptions {
    /// Prefix of the log file names, usually the binary name.
    pub app_name: String,
    /// Directory for log files. Created if missing.
    pub log_dir: PathBuf,
    /// Default filter directive (e.g. `info`, `lib_qlsbridge=debug`).
    /// `RUST_LOG` wins when set.
    pub log_level: String,
    /// Also print human-readable logs to stdout.
    pub use_tty: bool,
}

impl Default for LoggerLocalOptions {
    fn default() -> Self {
        Self {
            app_name: "qlsbridge".to_string(),
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
            use_tty: true,
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// File output is JSON, one file per process start named
/// `<app_name>-<YYYYmmdd_HHMMSS>.log`; older files of the same app are
/// removed first. The returned guard flushes the non-blocking writer when
/// dropped and must be held until the process exits.
pub fn setup_logging(options: &LoggerLocalOptions) -> Result<WorkerGuard, LoggerError> {
    std::fs::create_dir_all(&options.log_dir)?;

    // The new file is created after rotation so it is never a candidate.
    rotate_logs(&options.app_name, &options.log_dir, 0)?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let file_name = format!("{}-{}.log", options.app_name, timestamp);
    let (writer, guard) = non_blocking(rolling::never(&options.log_dir, &file_name));

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.log_level)
            .map_err(|_| LoggerError::FilterError(options.log_level.clone()))?,
    };

    let file_layer = fmt::layer().with_ansi(false).with_writer(writer).json();
    let console_layer = options
        .use_tty
        .then(|| fmt::layer().with_target(true).with_ansi(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggerError::InitError(e.to_string()))?;

    info!(
        "Logging initialized with level '{}' into {}",
        options.log_level,
        options.log_dir.join(&file_name).display()
    );
    Ok(guard)
}

/// Deletes all but the `keep` newest `<app_name>-*.log` files in `log_dir`.
///
/// File names embed a sortable timestamp, so "newest" is by name. Returns
/// the number of files removed; files that cannot be removed are reported on
/// stderr and skipped.
pub fn rotate_logs(app_name: &str, log_dir: &Path, keep: usize) -> Result<usize, LoggerError> {
    let pattern = format!("{}/{}-*.log", log_dir.display(), app_name);

    let mut log_files: Vec<PathBuf> = glob(&pattern)?.filter_map(Result::ok).collect();
    // Newest first.
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = 0;
    for old_file in log_files.iter().skip(keep) {
        match std::fs::remove_file(old_file) {
            Ok(()) => removed += 1,
            // No subscriber is installed yet at this point.
            Err(e) => eprintln!("Error deleting old log file {}: {}", old_file.display(), e),
        }
    }
    Ok(removed)
}
