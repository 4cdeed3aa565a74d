/// Row layout of the audit log.
///
/// Column order is fixed and shared with downstream analysis tooling:
/// `Timestamp, Event, Filename, File_Type, Size_Bytes, Permissions, Owner,
/// Group, Details`.
use crate::model::{ChangeEvent, EventKind, FileKind, TIMESTAMP_FORMAT};
use chrono::{NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

/// Header row, written once when the log file is created.
pub const HEADER: [&str; 9] = [
    "Timestamp",
    "Event",
    "Filename",
    "File_Type",
    "Size_Bytes",
    "Permissions",
    "Owner",
    "Group",
    "Details",
];

/// Placeholder for the name of an unknown subject.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Placeholder for text columns of an unknown subject.
pub const NOT_AVAILABLE: &str = "N/A";

/// One data row of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Local wall-clock time, seconds resolution.
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Event")]
    pub event: EventKind,
    #[serde(rename = "Filename")]
    pub filename: String,
    /// A [`FileKind`] label, or `N/A`.
    #[serde(rename = "File_Type")]
    pub file_type: String,
    #[serde(rename = "Size_Bytes")]
    pub size_bytes: u64,
    #[serde(rename = "Permissions")]
    pub permissions: String,
    #[serde(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Details")]
    pub details: String,
}

impl LogRecord {
    /// Build the row for `event`. Events without a subject snapshot get the
    /// `Unknown` / `N/A` / `0` placeholders.
    pub fn from_event(event: &ChangeEvent) -> Self {
        let timestamp = event.timestamp.naive_local().trunc_subsecs(0);
        match &event.snapshot {
            Some(snap) => Self {
                timestamp,
                event: event.kind,
                filename: snap.name.to_string(),
                file_type: snap.kind.label().to_owned(),
                size_bytes: snap.size_bytes,
                permissions: snap.permissions.to_string(),
                owner: snap.owner.to_string(),
                group: snap.group.to_string(),
                details: event.details.clone(),
            },
            None => Self {
                timestamp,
                event: event.kind,
                filename: UNKNOWN_NAME.to_owned(),
                file_type: NOT_AVAILABLE.to_owned(),
                size_bytes: 0,
                permissions: NOT_AVAILABLE.to_owned(),
                owner: NOT_AVAILABLE.to_owned(),
                group: NOT_AVAILABLE.to_owned(),
                details: event.details.clone(),
            },
        }
    }

    /// Parsed `File_Type`, or `None` for the placeholder.
    pub fn file_kind(&self) -> Option<FileKind> {
        self.file_type.parse().ok()
    }
}

/// serde adapter for the `Timestamp` column.
mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
