/// Structural diff of two directory states.
///
/// Pure: no I/O, no clock reads. The caller supplies the event timestamp.
use crate::model::{ChangeEvent, DirectoryState, EventKind, FileSnapshot};
use chrono::{DateTime, Local};

/// Layout of the change time in a Created event's details.
const CHANGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Detail text of a Deleted event.
pub const DELETED_DETAILS: &str = "File removed";

/// Clause used when only the modification time moved.
pub const CONTENT_MODIFIED: &str = "Content Modified";

/// Classify every difference between `previous` and `current`.
///
/// Emission order: all Created (in `current` order), then all Deleted (in
/// `previous` order), then all Modified (in `current` order). Each entry
/// produces at most one event.
pub fn diff_states(
    previous: &DirectoryState,
    current: &DirectoryState,
    now: DateTime<Local>,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for snap in current.iter().filter(|s| !previous.contains(&s.key)) {
        let details = format!("Created at {}", format_change_time(snap));
        events.push(ChangeEvent::new(now, EventKind::Created, snap.clone(), details));
    }

    // Deleted entries carry the last snapshot we saw; the path is gone.
    for snap in previous.iter().filter(|s| !current.contains(&s.key)) {
        events.push(ChangeEvent::new(
            now,
            EventKind::Deleted,
            snap.clone(),
            DELETED_DETAILS,
        ));
    }

    for snap in current.iter() {
        let Some(before) = previous.get(&snap.key) else {
            continue;
        };
        if let Some(details) = describe_modification(before, snap) {
            events.push(ChangeEvent::new(now, EventKind::Modified, snap.clone(), details));
        }
    }

    events
}

/// Clauses for every attribute that differs, joined with `"; "`, or `None`
/// when size, permissions and modification time all match.
pub fn describe_modification(before: &FileSnapshot, after: &FileSnapshot) -> Option<String> {
    let mut changes: Vec<String> = Vec::with_capacity(3);

    if before.size_bytes != after.size_bytes {
        changes.push(format!("Size: {}->{}", before.size_bytes, after.size_bytes));
    }
    if before.permissions != after.permissions {
        changes.push(format!("Perms: {}->{}", before.permissions, after.permissions));
    }
    if before.modified_at != after.modified_at {
        changes.push(CONTENT_MODIFIED.to_owned());
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes.join("; "))
    }
}

fn format_change_time(snap: &FileSnapshot) -> String {
    DateTime::<Local>::from(snap.changed_at)
        .format(CHANGE_TIME_FORMAT)
        .to_string()
}
