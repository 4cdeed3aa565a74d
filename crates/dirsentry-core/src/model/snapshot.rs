/// A single entry's observed state at one scan instant.
///
/// Snapshots are only ever built from a successful `lstat`; a path that has
/// vanished produces [`crate::scanner::Extraction::Absent`] instead of a
/// partially-filled record.
use compact_str::CompactString;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// Mutually exclusive classification of a directory entry.
///
/// Symbolic-link status is checked before directory status, so a link
/// pointing at a directory is a `SymbolicLink`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    RegularFile,
    Directory,
    SymbolicLink,
}

impl FileKind {
    /// Label used in the `File_Type` column of the audit log.
    pub fn label(self) -> &'static str {
        match self {
            Self::RegularFile => "Regular File",
            Self::Directory => "Directory",
            Self::SymbolicLink => "Symbolic Link",
        }
    }

    /// Classify from `lstat` metadata.
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let ft = meta.file_type();
        if ft.is_symlink() {
            Self::SymbolicLink
        } else if ft.is_dir() {
            Self::Directory
        } else {
            Self::RegularFile
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Regular File" => Ok(Self::RegularFile),
            "Directory" => Ok(Self::Directory),
            "Symbolic Link" => Ok(Self::SymbolicLink),
            other => Err(format!("unknown file type {other:?}")),
        }
    }
}

/// Permission bits of an entry (`st_mode & 0o7777`).
///
/// Displayed in octal with a `0o` prefix (`0o644`), which is also the form
/// written to the audit log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Permissions(u32);

impl Permissions {
    /// Mask for rwx triplets plus setuid/setgid/sticky.
    pub const MODE_MASK: u32 = 0o7777;

    /// Build from a raw `st_mode`, discarding the file-type bits.
    #[inline]
    pub fn from_mode(mode: u32) -> Self {
        Self(mode & Self::MODE_MASK)
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0o{:o}", self.0)
    }
}

/// Normalised metadata of one directory entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Raw base name as returned by the directory listing. Unique within a
    /// state and used as its key; names that are not valid UTF-8 stay
    /// distinct here.
    pub key: OsString,

    /// `key` converted lossily to UTF-8, for display and the log.
    pub name: CompactString,

    pub kind: FileKind,

    /// Size as reported by the OS. Not meaningful for directories and
    /// links, but still recorded.
    pub size_bytes: u64,

    pub permissions: Permissions,

    /// Resolved user name, or the numeric uid as text.
    pub owner: CompactString,

    /// Resolved group name, or the numeric gid as text.
    pub group: CompactString,

    /// Content modification time (`st_mtime`).
    pub modified_at: SystemTime,

    /// Metadata change time (`st_ctime`).
    pub changed_at: SystemTime,
}
