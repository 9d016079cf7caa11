use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lib_qlsbridge::qlstats::DEFAULT_BASE_URL;

/// Config file read when `--config-path` is not given.
const DEFAULT_CONFIG_FILE: &str = "server_qlsbridge.conf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "QLStats ranking bridge", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "QLSBRIDGE_PORT", help = "The HTTP server port.")]
    pub port: Option<u16>,

    #[clap(long, env = "QLSBRIDGE_GZIP", help = "Use gzip compression on responses (true/false).")]
    pub gzip: Option<bool>,

    #[clap(long, env = "QLSBRIDGE_TIMEOUT", help = "Deadline, in seconds, for a whole HTTP request.")]
    pub timeout: Option<u64>,

    #[clap(long, env = "QLSBRIDGE_API_URL", help = "Base URL of the QLStats API.")]
    pub api_base_url: Option<String>,

    #[clap(long, env = "QLSBRIDGE_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "QLSBRIDGE_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "QLSBRIDGE_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,
}

impl Config {
    /// Built-in defaults, the lowest layer.
    pub fn defaults() -> Config {
        Config {
            port: Some(40081),
            gzip: Some(false),
            timeout: Some(7),
            api_base_url: Some(DEFAULT_BASE_URL.to_string()),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            gzip: other.gzip.or(self.gzip),
            timeout: other.timeout.or(self.timeout),
            api_base_url: other.api_base_url.or(self.api_base_url),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    fn into_settings(self) -> Result<Settings, ConfigError> {
        let missing = |name: &str| ConfigError::Invalid(format!("{name} is not set"));

        let timeout = self.timeout.ok_or_else(|| missing("timeout"))?;
        if timeout == 0 {
            return Err(ConfigError::Invalid("timeout must be at least 1 second".to_string()));
        }

        Ok(Settings {
            port: self.port.ok_or_else(|| missing("port"))?,
            gzip: self.gzip.unwrap_or(false),
            deadline: Duration::from_secs(timeout),
            api_base_url: self.api_base_url.ok_or_else(|| missing("apiBaseUrl"))?,
            log_dir: self.log_dir.ok_or_else(|| missing("logDir"))?,
            log_level: self.log_level.ok_or_else(|| missing("logLevel"))?,
        })
    }
}

/// Fully resolved process settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub gzip: bool,
    /// Bound on every inbound request, fan-out included.
    pub deadline: Duration,
    pub api_base_url: String,
    pub log_dir: PathBuf,
    pub log_level: String,
}

/// Loads settings from the process arguments and environment.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(std::env::args_os())
}

/// Defaults, then the JSON config file, then environment variables and CLI
/// arguments (clap handles both), each layer overriding the previous one.
///
/// A missing default config file is not an error; an explicitly named one
/// that cannot be read is. A file that exists but does not parse is always
/// an error.
pub fn load_config_from<I, T>(args: I) -> Result<Settings, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Config::try_parse_from(args)?;

    let (config_file_path, explicit) = match &cli.config_path {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let mut current = Config::defaults();

    if explicit || config_file_path.exists() {
        let config_str = fs::read_to_string(&config_file_path).map_err(|source| ConfigError::Read {
            path: config_file_path.clone(),
            source,
        })?;
        let file_config =
            serde_json::from_str::<Config>(&config_str).map_err(|source| ConfigError::Parse {
                path: config_file_path.clone(),
                source,
            })?;
        current = current.merge(file_config);
    }

    current.merge(cli).into_settings()
}
