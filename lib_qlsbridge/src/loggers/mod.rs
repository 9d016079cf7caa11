/// Installs the `tracing` subscriber with console output and rotated JSON log files.
pub mod loggerlocal;

pub use loggerlocal::{rotate_logs, setup_logging, LoggerError, LoggerLocalOptions};
