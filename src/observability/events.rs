//! Observable events emitted by the framed file store

use std::fmt;

use super::logger::Severity;

/// Observable events in framestore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// File opened in some mode
    FileOpen,
    /// Open call rejected or failed
    FileOpenFailed,
    /// Flush during close failed
    FileCloseFailed,

    // Write path
    /// Write rejected or failed
    WriteFailed,
    /// Flush failed
    FlushFailed,

    // Read path
    /// Read buffer could not be allocated
    BufferAllocFailed,
    /// Read buffer grew past the large-buffer threshold
    LargeBufferAllocated,
    /// Fewer than four bytes remained where a length prefix was expected
    TornLengthPrefix,
    /// Unreadable bytes detected; the reader stops at this frame
    DataLoss,
    /// Replay reached a terminal outcome
    ReplayComplete,

    // Filesystem utilities
    /// Size query failed
    FileSizeFailed,
    /// File removal failed
    DeleteFailed,
    /// Directory creation failed
    DirectoryCreateFailed,
    /// Symbolic link creation failed
    SymlinkCreateFailed,
    /// Directory enumeration failed
    DirectoryListFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::FileOpen => "FILE_OPEN",
            Event::FileOpenFailed => "FILE_OPEN_FAILED",
            Event::FileCloseFailed => "FILE_CLOSE_FAILED",
            Event::WriteFailed => "WRITE_FAILED",
            Event::FlushFailed => "FLUSH_FAILED",
            Event::BufferAllocFailed => "BUFFER_ALLOC_FAILED",
            Event::LargeBufferAllocated => "LARGE_BUFFER_ALLOCATED",
            Event::TornLengthPrefix => "TORN_LENGTH_PREFIX",
            Event::DataLoss => "DATA_LOSS",
            Event::ReplayComplete => "REPLAY_COMPLETE",
            Event::FileSizeFailed => "FILE_SIZE_FAILED",
            Event::DeleteFailed => "DELETE_FAILED",
            Event::DirectoryCreateFailed => "DIRECTORY_CREATE_FAILED",
            Event::SymlinkCreateFailed => "SYMLINK_CREATE_FAILED",
            Event::DirectoryListFailed => "DIRECTORY_LIST_FAILED",
        }
    }

    /// Severity the event is logged at.
    pub fn severity(&self) -> Severity {
        match self {
            Event::FileOpen | Event::ReplayComplete => Severity::Info,
            Event::LargeBufferAllocated | Event::TornLengthPrefix | Event::DataLoss => {
                Severity::Warn
            }
            Event::FileOpenFailed
            | Event::FileCloseFailed
            | Event::WriteFailed
            | Event::FlushFailed
            | Event::BufferAllocFailed
            | Event::FileSizeFailed
            | Event::DeleteFailed
            | Event::DirectoryCreateFailed
            | Event::SymlinkCreateFailed
            | Event::DirectoryListFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
