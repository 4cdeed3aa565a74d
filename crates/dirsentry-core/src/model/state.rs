/// One complete scan of the monitored directory.
///
/// Snapshots are kept in listing order in a flat `Vec`, with a map from the
/// raw entry name to its index for O(1) membership checks. Only membership and per-key equality
/// carry meaning; the order just makes iteration deterministic for a given
/// scan.
use super::snapshot::FileSnapshot;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};

#[derive(Clone, Debug, Default)]
pub struct DirectoryState {
    entries: Vec<FileSnapshot>,
    index: HashMap<OsString, usize>,
}

impl DirectoryState {
    /// Create an empty state with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a snapshot keyed by its raw name.
    ///
    /// A second snapshot with the same name replaces the first in place.
    /// One listing pass never yields duplicates, so this only matters for
    /// hand-built states.
    pub fn insert(&mut self, snapshot: FileSnapshot) {
        match self.index.get(&snapshot.key) {
            Some(&pos) => self.entries[pos] = snapshot,
            None => {
                self.index.insert(snapshot.key.clone(), self.entries.len());
                self.entries.push(snapshot);
            }
        }
    }

    #[inline]
    pub fn get<K: AsRef<OsStr> + ?Sized>(&self, key: &K) -> Option<&FileSnapshot> {
        self.index.get(key.as_ref()).map(|&pos| &self.entries[pos])
    }

    #[inline]
    pub fn contains<K: AsRef<OsStr> + ?Sized>(&self, key: &K) -> bool {
        self.index.contains_key(key.as_ref())
    }

    /// Snapshots in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &FileSnapshot> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<FileSnapshot> for DirectoryState {
    fn from_iter<I: IntoIterator<Item = FileSnapshot>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut state = Self::with_capacity(iter.size_hint().0);
        for snapshot in iter {
            state.insert(snapshot);
        }
        state
    }
}
