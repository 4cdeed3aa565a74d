/// Data model for DirSentry.
///
/// Re-exports the snapshot, directory-state and change-event types.
pub mod event;
pub mod snapshot;
pub mod state;

pub use event::{ChangeEvent, EventKind, TIMESTAMP_FORMAT};
pub use snapshot::{FileKind, FileSnapshot, Permissions};
pub use state::DirectoryState;
