/// Error types for the core crate.
///
/// Vanished entries and unresolvable owner/group ids are not errors and have
/// no variant here; they are normal outcomes of a scan.
use std::path::PathBuf;

/// The monitored directory could not be listed.
///
/// Recoverable: the step contributes no events and the previous state is
/// left untouched.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to list directory {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ScanError {
    /// `true` when the directory itself no longer exists.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ListDirectory { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::ListDirectory { path, .. } => path,
        }
    }
}

/// A failure while appending to or reading the audit log.
///
/// Recoverable for appends: the event is not durably recorded and
/// monitoring continues.
#[derive(Debug, thiserror::Error)]
pub enum AuditLogError {
    #[error("failed to open audit log {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to lock audit log {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode audit record: {0}")]
    Encode(#[source] csv::Error),
    #[error("failed to write audit log {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse audit log {path}: {source}")]
    Parse {
        path: PathBuf,
        source: csv::Error,
    },
}

/// Invalid or unreadable monitor configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("polling interval must be greater than zero")]
    ZeroInterval,
    #[error("monitored directory path is empty")]
    EmptyDirectory,
    #[error("audit log path is empty")]
    EmptyLogFile,
}

/// A monitor could not be constructed.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    AuditLog(#[from] AuditLogError),
}
