//! File interface and factory
//!
//! The pipeline that drives record files works against `RecordFile` so the
//! backing implementation can be chosen by name at runtime. Only local
//! files (`"std"`) are built in.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};
use super::file::{FramedFile, OpenMode};
use super::outcome::ReadOutcome;

/// Operations on one record file.
pub trait RecordFile {
    /// Path the file is bound to
    fn path(&self) -> &Path;

    /// Whether something exists at the path
    fn exists(&self) -> bool;

    /// Open for sequential reading
    fn open_read(&mut self) -> StoreResult<()>;

    /// Open for appending, creating if absent
    fn open_append(&mut self) -> StoreResult<()>;

    /// Open for writing, creating if absent and discarding contents
    fn open_truncate(&mut self) -> StoreResult<()>;

    /// Current open mode
    fn open_mode(&self) -> OpenMode;

    /// Release the handle; idempotent
    fn close(&mut self);

    /// Prefix for a payload of the given length, empty when unframed
    fn frame_for(&self, payload_length: u32) -> Vec<u8>;

    /// Append bytes verbatim
    fn write(&mut self, data: &[u8]) -> StoreResult<()>;

    /// Hand buffered output to the OS
    fn flush(&mut self) -> StoreResult<()>;

    /// Read the next record
    fn read_next(&mut self) -> ReadOutcome;

    /// Size on disk, 0 if unknown
    fn file_size(&self) -> u64;

    /// Remove from disk, best effort
    fn delete_file(&self);

    /// Whether a handle is held
    fn is_open(&self) -> bool {
        self.open_mode() != OpenMode::Closed
    }
}

impl RecordFile for FramedFile {
    fn path(&self) -> &Path {
        FramedFile::path(self)
    }

    fn exists(&self) -> bool {
        FramedFile::exists(self)
    }

    fn open_read(&mut self) -> StoreResult<()> {
        FramedFile::open_read(self)
    }

    fn open_append(&mut self) -> StoreResult<()> {
        FramedFile::open_append(self)
    }

    fn open_truncate(&mut self) -> StoreResult<()> {
        FramedFile::open_truncate(self)
    }

    fn open_mode(&self) -> OpenMode {
        FramedFile::open_mode(self)
    }

    fn close(&mut self) {
        FramedFile::close(self)
    }

    fn frame_for(&self, payload_length: u32) -> Vec<u8> {
        FramedFile::frame_for(self, payload_length)
    }

    fn write(&mut self, data: &[u8]) -> StoreResult<()> {
        FramedFile::write(self, data)
    }

    fn flush(&mut self) -> StoreResult<()> {
        FramedFile::flush(self)
    }

    fn read_next(&mut self) -> ReadOutcome {
        FramedFile::read_next(self)
    }

    fn file_size(&self) -> u64 {
        FramedFile::file_size(self)
    }

    fn delete_file(&self) {
        FramedFile::delete_file(self)
    }
}

/// Backing implementations the factory can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Local filesystem
    Std,
}

impl FileKind {
    /// Returns the name used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Std => "std",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "std" => Ok(FileKind::Std),
            other => Err(StoreError::unsupported_kind(other)),
        }
    }
}

/// Builds a closed record file of the given kind.
pub fn create_record_file(
    kind: FileKind,
    path: impl Into<PathBuf>,
    framed: bool,
    config: StoreConfig,
) -> Box<dyn RecordFile> {
    match kind {
        FileKind::Std => Box::new(FramedFile::with_config(path, framed, config)),
    }
}

/// Builds a closed record file from a kind name such as `"std"`.
pub fn create_record_file_by_name(
    kind: &str,
    path: impl Into<PathBuf>,
    framed: bool,
    config: StoreConfig,
) -> StoreResult<Box<dyn RecordFile>> {
    let kind = kind.parse::<FileKind>()?;
    Ok(create_record_file(kind, path, framed, config))
}
