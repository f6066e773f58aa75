//! Store error types
//!
//! Error codes:
//! - FRAMESTORE_NOT_OPEN
//! - FRAMESTORE_ALREADY_OPEN
//! - FRAMESTORE_IO_FAILURE
//! - FRAMESTORE_RESOURCE_EXHAUSTION
//! - FRAMESTORE_FORMAT_CORRUPTION
//! - FRAMESTORE_FS_OPERATION_FAILED
//! - FRAMESTORE_UNSUPPORTED_FILE_KIND
//!
//! All store errors are recoverable. Nothing in the store terminates the
//! process; callers decide whether to retry, skip, or halt.

use std::fmt;
use std::io;
use std::path::Path;

/// Store-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Operation needs an open mode the store is not in
    NotOpen,
    /// Open attempted while a mode is already active
    AlreadyOpen,
    /// Underlying read, write, flush or open call failed
    IoFailure,
    /// Memory for the read buffer could not be obtained
    ResourceExhaustion,
    /// Bytes on disk or handed to the writer violate the frame format
    FormatCorruption,
    /// Directory, symlink, size or listing call failed
    FilesystemOperationFailure,
    /// Factory was asked for a file kind it cannot build
    UnsupportedFileKind,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::NotOpen => "FRAMESTORE_NOT_OPEN",
            StoreErrorCode::AlreadyOpen => "FRAMESTORE_ALREADY_OPEN",
            StoreErrorCode::IoFailure => "FRAMESTORE_IO_FAILURE",
            StoreErrorCode::ResourceExhaustion => "FRAMESTORE_RESOURCE_EXHAUSTION",
            StoreErrorCode::FormatCorruption => "FRAMESTORE_FORMAT_CORRUPTION",
            StoreErrorCode::FilesystemOperationFailure => "FRAMESTORE_FS_OPERATION_FAILED",
            StoreErrorCode::UnsupportedFileKind => "FRAMESTORE_UNSUPPORTED_FILE_KIND",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with code, message and optional context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Operation requires a mode the store is not open in
    pub fn not_open(path: &Path, required: &str) -> Self {
        Self::new(StoreErrorCode::NotOpen, format!("File is not open for {}", required))
            .with_path(path)
    }

    /// Open attempted on an already-open store
    pub fn already_open(path: &Path) -> Self {
        Self::new(StoreErrorCode::AlreadyOpen, "File is already open").with_path(path)
    }

    /// Underlying I/O call failed
    pub fn io_failure(path: &Path, message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::IoFailure, message)
            .with_path(path)
            .with_source(source)
    }

    /// Output stream failed earlier and refuses further writes
    pub fn stream_failed(path: &Path) -> Self {
        Self::new(
            StoreErrorCode::IoFailure,
            "Output stream is in a failed state after an earlier error",
        )
        .with_path(path)
    }

    /// Buffer allocation failed
    pub fn resource_exhaustion(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::ResourceExhaustion, message)
    }

    /// Frame format violated
    pub fn format_corruption(path: &Path, message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::FormatCorruption, message).with_path(path)
    }

    /// Directory, symlink or listing call failed
    pub fn fs_operation(path: &Path, message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::FilesystemOperationFailure, message)
            .with_path(path)
            .with_source(source)
    }

    /// Unknown file kind requested from the factory
    pub fn unsupported_kind(kind: &str) -> Self {
        Self::new(
            StoreErrorCode::UnsupportedFileKind,
            format!("Unsupported file kind: {}", kind),
        )
    }

    fn with_path(mut self, path: &Path) -> Self {
        self.details = Some(format!("path: {}", path.display()));
        self
    }

    fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns the underlying I/O error kind, if any
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        self.source.as_ref().map(|e| e.kind())
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
