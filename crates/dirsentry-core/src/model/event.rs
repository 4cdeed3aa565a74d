/// Change events produced by diffing two directory states.
use super::snapshot::FileSnapshot;
use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout used for display and the `Timestamp` log column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kind of transition detected between two scans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "CREATED")]
    Created,
    #[serde(rename = "DELETED")]
    Deleted,
    #[serde(rename = "MODIFIED")]
    Modified,
}

impl EventKind {
    /// Label used in the `Event` column of the audit log.
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Deleted => "DELETED",
            Self::Modified => "MODIFIED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One detected transition. Created, logged and discarded; the audit log
/// is the only durable record.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
    /// Entry name the event refers to.
    pub name: CompactString,
    /// New snapshot for Created/Modified, last-known snapshot for Deleted.
    /// `None` only for events built with [`ChangeEvent::without_subject`].
    pub snapshot: Option<FileSnapshot>,
    /// Human-readable description of what changed.
    pub details: String,
}

impl ChangeEvent {
    /// Event about a known entry.
    pub fn new(
        timestamp: DateTime<Local>,
        kind: EventKind,
        snapshot: FileSnapshot,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            kind,
            name: snapshot.name.clone(),
            snapshot: Some(snapshot),
            details: details.into(),
        }
    }

    /// Event whose subject could not be determined. Logged with the
    /// `Unknown` / `N/A` / `0` placeholders.
    pub fn without_subject(
        timestamp: DateTime<Local>,
        kind: EventKind,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            kind,
            name: CompactString::new("Unknown"),
            snapshot: None,
            details: details.into(),
        }
    }
}

impl fmt::Display for ChangeEvent {
    /// `[2024-05-01 12:00:00] CREATED: a.txt - Created at ...`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.kind,
            self.name,
            self.details
        )
    }
}
