/// Parses an audit log back into typed rows.
///
/// Consumers must not assume the file fits any particular size; this reads
/// the whole log into memory, which is what offline summaries want.
use super::record::LogRecord;
use crate::error::AuditLogError;
use std::fs::File;
use std::path::Path;

/// Read every data row of the log at `path`, in file order.
pub fn read_log(path: &Path) -> Result<Vec<LogRecord>, AuditLogError> {
    let file = File::open(path).map_err(|source| AuditLogError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    rdr.deserialize()
        .collect::<Result<Vec<LogRecord>, _>>()
        .map_err(|source| AuditLogError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
