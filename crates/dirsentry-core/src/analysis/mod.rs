/// Analysis modules: offline views over a parsed audit log.

pub mod summary;

pub use summary::{summarize, ActiveEntry, EventSummary, FileTypeCount};
