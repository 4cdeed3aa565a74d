/// Monitor configuration.
///
/// Loaded from an optional JSON file; every field has a default so a file
/// only needs to name what it changes. The CLI overrides file values.
use crate::error::ConfigError;
use crate::scanner::DEFAULT_PARALLEL_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DIRECTORY: &str = "./monitor_test";
pub const DEFAULT_LOG_FILE: &str = "directory_log.csv";
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// What a step does when the monitored directory itself has disappeared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDirectoryPolicy {
    /// Report a scan failure and keep the last good state. A later
    /// successful scan is diffed against that state.
    #[default]
    Freeze,
    /// Emit one Deleted event per previously known entry and continue from
    /// an empty state, so reappearing entries are reported as Created.
    FlushDeleted,
}

/// Settings for one monitor instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Directory to watch (non-recursive).
    pub directory: PathBuf,
    /// CSV audit log to append to.
    pub log_file: PathBuf,
    /// Delay between steps, in milliseconds.
    pub interval_ms: u64,
    pub on_missing_directory: MissingDirectoryPolicy,
    /// Entry count at which extraction goes parallel. `0` disables it.
    pub parallel_threshold: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            interval_ms: DEFAULT_INTERVAL_MS,
            on_missing_directory: MissingDirectoryPolicy::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl MonitorConfig {
    /// Defaults with the given directory and log file.
    pub fn new(directory: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            log_file: log_file.into(),
            ..Self::default()
        }
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.directory.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDirectory);
        }
        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::EmptyLogFile);
        }
        Ok(())
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
