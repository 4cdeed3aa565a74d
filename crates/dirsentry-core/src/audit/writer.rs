/// Append-only CSV writer for the audit log.
///
/// Every append opens the file in append mode, takes an exclusive `flock`,
/// writes the header if the file is still empty (or drops a torn final row
/// left by an interrupted write), writes one fully encoded record with a
/// single `write_all`, and releases the lock. Records from
/// concurrent writers (threads or processes) never interleave; their
/// relative order is unspecified.
use super::record::{LogRecord, HEADER};
use crate::error::AuditLogError;
use crate::model::ChangeEvent;
use crate::platform::lock_exclusive;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Handle to an audit log file.
///
/// Holds no open descriptor between appends, so the file may be rotated or
/// removed externally; the next append recreates it with a fresh header.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Open (creating if needed) the log at `path`.
    ///
    /// Writes the header row if the file is new or empty. An existing,
    /// non-empty log is left untouched so records survive restarts.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuditLogError> {
        let log = Self { path: path.into() };
        let file = log.open_for_append()?;
        let _guard = lock_exclusive(&file).map_err(|source| AuditLogError::Lock {
            path: log.path.clone(),
            source,
        })?;
        log.prepare_tail(&file)?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the row for `event`.
    pub fn append(&self, event: &ChangeEvent) -> Result<(), AuditLogError> {
        self.append_record(&LogRecord::from_event(event))
    }

    /// Append a prepared row.
    pub fn append_record(&self, record: &LogRecord) -> Result<(), AuditLogError> {
        // Encode before taking the lock so the critical section is one write.
        let bytes = encode_record(record)?;

        let file = self.open_for_append()?;
        let _guard = lock_exclusive(&file).map_err(|source| AuditLogError::Lock {
            path: self.path.clone(),
            source,
        })?;
        self.prepare_tail(&file)?;
        self.write_bytes(&file, &bytes)
    }

    fn open_for_append(&self) -> Result<File, AuditLogError> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| AuditLogError::Open {
                path: self.path.clone(),
                source,
            })
    }

    /// Leave `file` ending on a record boundary. Caller must hold the lock.
    ///
    /// An empty file gets the header. A file whose last byte is not a
    /// newline ends in a row torn by an interrupted write; that row is
    /// truncated away so the next record starts on its own line.
    fn prepare_tail(&self, file: &File) -> Result<(), AuditLogError> {
        let write_err = |source: io::Error| AuditLogError::Write {
            path: self.path.clone(),
            source,
        };
        let len = file
            .metadata()
            .map_err(|source| AuditLogError::Open {
                path: self.path.clone(),
                source,
            })?
            .len();

        if len > 0 {
            let mut last = [0u8; 1];
            file.read_exact_at(&mut last, len - 1).map_err(write_err)?;
            if last[0] == b'\n' {
                return Ok(());
            }
            let keep = last_record_start(file).map_err(write_err)?;
            warn!(
                "Audit log: dropping {} bytes of torn record at the end of {}",
                len - keep,
                self.path.display()
            );
            file.set_len(keep).map_err(write_err)?;
            if keep > 0 {
                return Ok(());
            }
        }

        debug!("Audit log: writing header to {}", self.path.display());
        self.write_bytes(file, &encode_header()?)
    }

    fn write_bytes(&self, mut file: &File, bytes: &[u8]) -> Result<(), AuditLogError> {
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|source| AuditLogError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

/// Byte offset at which the final record of `file` begins.
///
/// The final record may hold quoted newlines, so this parses rather than
/// searching for the last `\n`.
fn last_record_start(file: &File) -> io::Result<u64> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);
    let mut record = csv::ByteRecord::new();
    let mut start = 0;
    while rdr.read_byte_record(&mut record).map_err(io::Error::other)? {
        start = record.position().map_or(0, |p| p.byte());
    }
    Ok(start)
}

fn encode_header() -> Result<Vec<u8>, AuditLogError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(HEADER).map_err(AuditLogError::Encode)?;
    wtr.into_inner()
        .map_err(|e| AuditLogError::Encode(e.into_error().into()))
}

fn encode_record(record: &LogRecord) -> Result<Vec<u8>, AuditLogError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.serialize(record).map_err(AuditLogError::Encode)?;
    wtr.into_inner()
        .map_err(|e| AuditLogError::Encode(e.into_error().into()))
}
