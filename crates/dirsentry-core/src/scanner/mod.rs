/// Scanner module: lists the monitored directory and extracts every entry.
///
/// One scan is one `read_dir` pass (non-recursive) followed by an `lstat`
/// per entry. Large directories fan the extraction out over the rayon global
/// pool; results are collected back in listing order before the
/// [`DirectoryState`] is assembled, so nothing downstream ever sees a
/// partially built state.
pub mod extract;

pub use extract::{extract, Extraction};

use crate::error::ScanError;
use crate::model::DirectoryState;
use crate::platform::IdentityResolver;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// Default number of entries at which extraction switches to the rayon pool.
///
/// Below this a scan is a handful of syscalls and the thread hand-off costs
/// more than it saves.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 512;

/// Scan `dir` into a fresh [`DirectoryState`].
///
/// Entries that vanish between listing and inspection are dropped silently;
/// entries that cannot be inspected are dropped with a debug log. Only a
/// failure to list the directory itself is an error.
///
/// `parallel_threshold == 0` disables parallel extraction.
pub fn scan_directory(
    dir: &Path,
    resolver: &dyn IdentityResolver,
    parallel_threshold: usize,
) -> Result<DirectoryState, ScanError> {
    let start = Instant::now();
    let list_err = |source: std::io::Error| ScanError::ListDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(list_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(list_err)?;

    let parallel = parallel_threshold > 0 && paths.len() >= parallel_threshold;
    let extractions: Vec<Extraction> = if parallel {
        paths.par_iter().map(|p| extract(p, resolver)).collect()
    } else {
        paths.iter().map(|p| extract(p, resolver)).collect()
    };

    let mut state = DirectoryState::with_capacity(extractions.len());
    let mut skipped = 0usize;
    for (path, extraction) in paths.iter().zip(extractions) {
        match extraction {
            Extraction::Present(snapshot) => state.insert(snapshot),
            Extraction::Absent => skipped += 1,
            Extraction::Unreadable(err) => {
                debug!("Scan: skipping unreadable {}: {}", path.display(), err);
                skipped += 1;
            }
        }
    }

    debug!(
        "Scan of {}: {} entries ({} skipped, parallel={}) in {:?}",
        dir.display(),
        state.len(),
        skipped,
        parallel,
        start.elapsed()
    );
    Ok(state)
}
