/// Persistent audit log: one CSV header row followed by one row per change
/// event. Append-only; a step never rewrites earlier rows.
pub mod reader;
pub mod record;
pub mod writer;

pub use reader::read_log;
pub use record::{LogRecord, HEADER, NOT_AVAILABLE, UNKNOWN_NAME};
pub use writer::AuditLog;
