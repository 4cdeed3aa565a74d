/// Event summary over a parsed audit log: per-kind counts, per-file-type
/// counts, and the most frequently changed entries.
use crate::audit::LogRecord;
use crate::model::EventKind;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Number of events recorded for one file-type label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypeCount {
    /// `File_Type` column value (including the `N/A` placeholder).
    pub file_type: String,
    pub events: u64,
}

/// An entry ranked by how many events mention it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntry {
    pub name: String,
    pub events: u64,
}

/// Aggregate view of an audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSummary {
    pub total: u64,
    pub created: u64,
    pub deleted: u64,
    pub modified: u64,
    /// Sorted by count descending, then label.
    pub by_file_type: Vec<FileTypeCount>,
    /// Sorted by count descending, then name. At most `max_active` long.
    pub most_active: Vec<ActiveEntry>,
    pub first_at: Option<NaiveDateTime>,
    pub last_at: Option<NaiveDateTime>,
}

impl EventSummary {
    pub fn count(&self, kind: EventKind) -> u64 {
        match kind {
            EventKind::Created => self.created,
            EventKind::Deleted => self.deleted,
            EventKind::Modified => self.modified,
        }
    }
}

/// Summarise `records`, keeping the `max_active` most active entries.
pub fn summarize(records: &[LogRecord], max_active: usize) -> EventSummary {
    let mut summary = EventSummary::default();
    let mut types: HashMap<&str, u64> = HashMap::new();
    let mut names: HashMap<&str, u64> = HashMap::new();

    for record in records {
        summary.total += 1;
        match record.event {
            EventKind::Created => summary.created += 1,
            EventKind::Deleted => summary.deleted += 1,
            EventKind::Modified => summary.modified += 1,
        }
        *types.entry(record.file_type.as_str()).or_default() += 1;
        *names.entry(record.filename.as_str()).or_default() += 1;

        summary.first_at = Some(match summary.first_at {
            Some(t) => t.min(record.timestamp),
            None => record.timestamp,
        });
        summary.last_at = Some(match summary.last_at {
            Some(t) => t.max(record.timestamp),
            None => record.timestamp,
        });
    }

    let mut by_file_type: Vec<FileTypeCount> = types
        .into_iter()
        .map(|(file_type, events)| FileTypeCount {
            file_type: file_type.to_owned(),
            events,
        })
        .collect();
    by_file_type.sort_by(|a, b| b.events.cmp(&a.events).then(a.file_type.cmp(&b.file_type)));
    summary.by_file_type = by_file_type;

    summary.most_active = most_active(names, max_active);
    summary
}

/// Top-`n` entries by event count.
///
/// Uses `select_nth_unstable_by` to bring the top `n` to the front before
/// sorting only those, since logs can name far more entries than we keep.
fn most_active(names: HashMap<&str, u64>, n: usize) -> Vec<ActiveEntry> {
    if n == 0 {
        return Vec::new();
    }
    let mut entries: Vec<ActiveEntry> = names
        .into_iter()
        .map(|(name, events)| ActiveEntry {
            name: name.to_owned(),
            events,
        })
        .collect();

    let order = |a: &ActiveEntry, b: &ActiveEntry| b.events.cmp(&a.events).then(a.name.cmp(&b.name));
    if entries.len() > n {
        entries.select_nth_unstable_by(n - 1, order);
        entries.truncate(n);
    }
    entries.sort_unstable_by(order);
    entries
}
