//! Framed file store for framestore
//!
//! A framed file is an append-only sequence of length-prefixed records,
//! written by one producer and read back sequentially by one consumer.
//!
//! # Design Principles
//!
//! - Append-only; no random access, no in-place updates
//! - One open mode at a time per instance
//! - Reads never panic and never return `Err`; damage is reported as a
//!   loss estimate so the caller can log it and decide what to do
//! - Read buffer reused across records, released after oversized ones
//! - Failures are logged where they happen and returned as values
//!
//! Concurrent writers on the same path are not arbitrated here. A reader
//! trailing a writer may see a half-written frame and report it as loss.

mod buffer;
mod config;
mod errors;
mod file;
mod fs;
mod interface;
mod outcome;
mod reader;
mod replay;

pub use buffer::ReadBuffer;
pub use config::{
    ConfigError, ConfigResult, StoreConfig, DEFAULT_BASELINE_BUFFER_SIZE,
    DEFAULT_LARGE_BUFFER_MULTIPLE, DEFAULT_MAX_RECORD_LENGTH,
};
pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use file::{FramedFile, OpenMode};
pub use fs::{create_directory, create_symlink, file_size_of, list_directory, path_exists, remove_file};
pub use interface::{create_record_file, create_record_file_by_name, FileKind, RecordFile};
pub use outcome::{estimate_loss, DataLoss, LossReason, ReadOutcome, LOSS_SENTINEL};
pub use replay::{RecordReplayer, RecordSink, Records, ReplayStats};
