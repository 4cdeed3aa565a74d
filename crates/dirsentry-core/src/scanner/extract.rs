/// Metadata extractor: turns one path into a [`FileSnapshot`].
///
/// Uses `lstat` semantics throughout, so links are described rather than
/// followed and a dangling link is still observed.
use crate::model::{FileKind, FileSnapshot, Permissions};
use crate::platform::{group_or_gid, owner_or_uid, IdentityResolver};
use compact_str::CompactString;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Outcome of inspecting one path.
#[derive(Debug)]
pub enum Extraction {
    /// The entry exists and was fully described.
    Present(FileSnapshot),
    /// The path did not exist at inspection time (e.g. deleted between the
    /// directory listing and the stat). A normal outcome.
    Absent,
    /// The entry exists but could not be inspected (permission denied and
    /// the like). Callers treat it like `Absent`.
    Unreadable(io::Error),
}

impl Extraction {
    /// The snapshot, if the entry was present.
    pub fn into_snapshot(self) -> Option<FileSnapshot> {
        match self {
            Self::Present(snapshot) => Some(snapshot),
            Self::Absent | Self::Unreadable(_) => None,
        }
    }
}

/// Inspect `path` and build its snapshot.
///
/// Owner and group names come from `resolver`; unknown ids fall back to the
/// numeric id as text. Never panics.
pub fn extract(path: &Path, resolver: &dyn IdentityResolver) -> Extraction {
    let key = match path.file_name() {
        Some(n) => n.to_os_string(),
        None => {
            return Extraction::Unreadable(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", path.display()),
            ))
        }
    };

    let meta = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Extraction::Absent,
        Err(e) => return Extraction::Unreadable(e),
    };

    Extraction::Present(FileSnapshot {
        name: CompactString::new(key.to_string_lossy()),
        key,
        kind: FileKind::from_metadata(&meta),
        size_bytes: meta.len(),
        permissions: Permissions::from_mode(meta.mode()),
        owner: owner_or_uid(resolver, meta.uid()),
        group: group_or_gid(resolver, meta.gid()),
        modified_at: unix_time(meta.mtime(), meta.mtime_nsec()),
        changed_at: unix_time(meta.ctime(), meta.ctime_nsec()),
    })
}

/// Convert a `(seconds, nanoseconds)` pair from `stat` into a `SystemTime`.
fn unix_time(secs: i64, nsec: i64) -> SystemTime {
    let nanos = nsec.clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nanos)
    } else {
        // Pre-epoch: step back whole seconds, then forward the fraction.
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + Duration::from_nanos(nanos as u64)
    }
}
