//! Framed file: lifecycle and write path
//!
//! One `FramedFile` owns one OS handle and one read buffer. It is opened in
//! exactly one mode at a time:
//!
//! - read: sequential input only
//! - append: output at end of file, created if absent, never truncated
//! - truncate: output into a file emptied on open, created if absent
//!
//! Output is buffered; `flush` hands it to the OS. Nothing here fsyncs.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::frame::FrameCodec;
use crate::observability::{log_event, Event, StoreMetrics};

use super::buffer::ReadBuffer;
use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};
use super::fs::{file_size_of, log_path_error, path_exists, remove_file};

/// Mode a framed file is currently open in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// No handle held
    Closed,
    /// Sequential input
    Read,
    /// Output appended at end of file
    Append,
    /// Output into a file emptied on open
    Truncate,
}

impl OpenMode {
    /// Returns the string representation used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenMode::Closed => "closed",
            OpenMode::Read => "read",
            OpenMode::Append => "append",
            OpenMode::Truncate => "truncate",
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub(super) enum Handle {
    Closed,
    Reader(BufReader<File>),
    Writer {
        writer: BufWriter<File>,
        mode: OpenMode,
        /// Set after any failed write or flush; later writes are refused
        failed: bool,
    },
}

/// An append-only file of length-framed records.
///
/// With framing disabled the same type is a plain byte appender: `frame_for`
/// yields nothing and `write` appends bytes verbatim.
pub struct FramedFile {
    pub(super) path: PathBuf,
    pub(super) codec: FrameCodec,
    pub(super) config: StoreConfig,
    pub(super) handle: Handle,
    pub(super) buffer: ReadBuffer,
    pub(super) metrics: StoreMetrics,
}

impl FramedFile {
    /// Create a closed file bound to `path` with default thresholds.
    pub fn new(path: impl Into<PathBuf>, framed: bool) -> Self {
        Self::with_config(path, framed, StoreConfig::default())
    }

    /// Create a closed file bound to `path` with explicit thresholds.
    pub fn with_config(path: impl Into<PathBuf>, framed: bool, config: StoreConfig) -> Self {
        Self {
            path: path.into(),
            codec: FrameCodec::new(framed),
            buffer: ReadBuffer::new(&config),
            config,
            handle: Handle::Closed,
            metrics: StoreMetrics::new(),
        }
    }

    /// Returns the path this file is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether records are length-framed.
    pub fn is_framed(&self) -> bool {
        self.codec.is_framed()
    }

    /// Returns the reader thresholds.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the counters for this file.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Returns the read buffer, for inspecting its capacity.
    pub fn read_buffer(&self) -> &ReadBuffer {
        &self.buffer
    }

    /// Returns whether something exists at the bound path.
    pub fn exists(&self) -> bool {
        path_exists(&self.path)
    }

    /// Opens for sequential reading.
    pub fn open_read(&mut self) -> StoreResult<()> {
        self.ensure_closed()?;
        let file = File::open(&self.path).map_err(|e| self.open_failed(OpenMode::Read, e))?;
        self.handle = Handle::Reader(BufReader::new(file));
        self.log_opened(OpenMode::Read);
        Ok(())
    }

    /// Opens for appending, creating the file if absent.
    pub fn open_append(&mut self) -> StoreResult<()> {
        self.open_output(OpenMode::Append)
    }

    /// Opens for writing, creating the file if absent and discarding its contents.
    pub fn open_truncate(&mut self) -> StoreResult<()> {
        self.open_output(OpenMode::Truncate)
    }

    fn open_output(&mut self, mode: OpenMode) -> StoreResult<()> {
        self.ensure_closed()?;

        let mut options = OpenOptions::new();
        options.create(true);
        if mode == OpenMode::Truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }

        let file = options
            .open(&self.path)
            .map_err(|e| self.open_failed(mode, e))?;

        self.handle = Handle::Writer {
            writer: BufWriter::new(file),
            mode,
            failed: false,
        };
        self.log_opened(mode);
        Ok(())
    }

    fn ensure_closed(&self) -> StoreResult<()> {
        if self.is_open() {
            log_path_error(Event::FileOpenFailed, &self.path, &"already open");
            return Err(StoreError::already_open(&self.path));
        }
        Ok(())
    }

    fn open_failed(&self, mode: OpenMode, e: std::io::Error) -> StoreError {
        log_path_error(Event::FileOpenFailed, &self.path, &e);
        StoreError::io_failure(&self.path, format!("Failed to open for {}", mode), e)
    }

    fn log_opened(&self, mode: OpenMode) {
        let path = self.path.display().to_string();
        log_event(
            Event::FileOpen,
            &[("path", path.as_str()), ("mode", mode.as_str())],
        );
    }

    /// Returns whether a handle is held.
    pub fn is_open(&self) -> bool {
        !matches!(self.handle, Handle::Closed)
    }

    /// Returns the current open mode.
    pub fn open_mode(&self) -> OpenMode {
        match self.handle {
            Handle::Closed => OpenMode::Closed,
            Handle::Reader(_) => OpenMode::Read,
            Handle::Writer { mode, .. } => mode,
        }
    }

    /// Releases the handle, flushing buffered output first.
    ///
    /// Closing a closed file does nothing. A failed final flush is logged.
    pub fn close(&mut self) {
        if let Handle::Writer { mut writer, .. } =
            std::mem::replace(&mut self.handle, Handle::Closed)
        {
            if let Err(e) = writer.flush() {
                log_path_error(Event::FileCloseFailed, &self.path, &e);
            }
        }
    }

    /// Returns the prefix to write ahead of a `payload_length`-byte payload.
    ///
    /// Empty when framing is disabled. Callers building a multi-record
    /// append themselves must put this in front of each payload.
    pub fn frame_for(&self, payload_length: u32) -> Vec<u8> {
        self.codec.frame_for(payload_length)
    }

    /// Appends `data` verbatim. Does not flush.
    pub fn write(&mut self, data: &[u8]) -> StoreResult<()> {
        let result = match &mut self.handle {
            Handle::Writer { writer, failed, .. } => {
                if *failed {
                    Err(StoreError::stream_failed(&self.path))
                } else {
                    writer.write_all(data).map_err(|e| {
                        *failed = true;
                        StoreError::io_failure(&self.path, "Failed to write", e)
                    })
                }
            }
            _ => Err(StoreError::not_open(&self.path, "writing")),
        };

        match result {
            Ok(()) => {
                self.metrics.add_write(data.len() as u64);
                Ok(())
            }
            Err(e) => {
                log_path_error(Event::WriteFailed, &self.path, &e);
                Err(e)
            }
        }
    }

    /// Frames `payload` and appends prefix and payload as one write.
    pub fn append_record(&mut self, payload: &[u8]) -> StoreResult<()> {
        let frame = self
            .codec
            .frame(payload, self.config.max_record_length)
            .map_err(|e| {
                log_path_error(Event::WriteFailed, &self.path, &e);
                StoreError::format_corruption(&self.path, e.to_string())
            })?;
        self.write(&frame)?;
        self.metrics.increment_records_written();
        Ok(())
    }

    /// Hands buffered output to the OS. Does nothing unless open for output.
    pub fn flush(&mut self) -> StoreResult<()> {
        if let Handle::Writer { writer, failed, .. } = &mut self.handle {
            if let Err(e) = writer.flush() {
                *failed = true;
                log_path_error(Event::FlushFailed, &self.path, &e);
                return Err(StoreError::io_failure(&self.path, "Failed to flush", e));
            }
        }
        Ok(())
    }

    /// Returns the current size of the file on disk, 0 if it cannot be stat'ed.
    ///
    /// Unflushed output is not counted.
    pub fn file_size(&self) -> u64 {
        file_size_of(&self.path)
    }

    /// Removes the file from disk. Best effort; failures are only logged.
    pub fn delete_file(&self) {
        remove_file(&self.path);
    }
}

impl Drop for FramedFile {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for FramedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramedFile")
            .field("path", &self.path)
            .field("framed", &self.is_framed())
            .field("mode", &self.open_mode())
            .field("buffer_capacity", &self.buffer.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::errors::StoreErrorCode;
    use std::fs;
    use tempfile::TempDir;

    fn temp_file(temp_dir: &TempDir, framed: bool) -> FramedFile {
        FramedFile::new(temp_dir.path().join("records.dat"), framed)
    }

    #[test]
    fn test_new_file_is_closed() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_file(&temp_dir, true);
        assert!(!file.is_open());
        assert_eq!(file.open_mode(), OpenMode::Closed);
        assert!(!file.exists());
    }

    #[test]
    fn test_open_append_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        file.open_append().unwrap();
        assert!(file.is_open());
        assert_eq!(file.open_mode(), OpenMode::Append);
        assert!(file.exists());
        assert_eq!(file.file_size(), 0);
    }

    #[test]
    fn test_open_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        file.open_append().unwrap();
        let err = file.open_read().unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::AlreadyOpen);
        assert_eq!(file.open_mode(), OpenMode::Append);
    }

    #[test]
    fn test_open_read_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        let err = file.open_read().unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::IoFailure);
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
        assert!(!file.is_open());
    }

    #[test]
    fn test_append_preserves_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, false);
        fs::write(file.path(), b"head").unwrap();

        file.open_append().unwrap();
        file.write(b"tail").unwrap();
        file.close();

        assert_eq!(fs::read(file.path()).unwrap(), b"headtail");
    }

    #[test]
    fn test_truncate_discards_content() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, false);
        fs::write(file.path(), b"old content").unwrap();

        file.open_truncate().unwrap();
        assert_eq!(file.open_mode(), OpenMode::Truncate);
        assert_eq!(file.file_size(), 0);

        file.write(b"new").unwrap();
        file.close();
        assert_eq!(fs::read(file.path()).unwrap(), b"new");
    }

    #[test]
    fn test_write_requires_output_mode() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        let err = file.write(b"x").unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NotOpen);

        fs::write(file.path(), b"").unwrap();
        file.open_read().unwrap();
        let err = file.write(b"x").unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NotOpen);
    }

    #[test]
    fn test_write_does_not_flush_until_asked() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, false);

        file.open_append().unwrap();
        file.write(b"buffered").unwrap();
        assert_eq!(file.file_size(), 0);

        file.flush().unwrap();
        assert_eq!(file.file_size(), 8);
    }

    #[test]
    fn test_flush_when_not_open_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);
        assert!(file.flush().is_ok());
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        file.close();
        assert!(!file.is_open());

        file.open_append().unwrap();
        file.close();
        file.close();
        assert!(!file.is_open());
    }

    #[test]
    fn test_reopen_after_close() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        file.open_append().unwrap();
        file.close();
        file.open_read().unwrap();
        assert_eq!(file.open_mode(), OpenMode::Read);
    }

    #[test]
    fn test_frame_for_follows_framing_flag() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(temp_file(&temp_dir, true).frame_for(2), vec![2, 0, 0, 0]);
        assert!(temp_file(&temp_dir, false).frame_for(2).is_empty());
    }

    #[test]
    fn test_append_record_writes_prefix_and_payload() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        file.open_append().unwrap();
        file.append_record(b"bb").unwrap();
        file.close();

        assert_eq!(fs::read(file.path()).unwrap(), vec![2, 0, 0, 0, b'b', b'b']);
        let snapshot = file.metrics().snapshot();
        assert_eq!(snapshot.records_written, 1);
        assert_eq!(snapshot.bytes_written, 6);
    }

    #[test]
    fn test_append_record_rejects_empty_payload() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        file.open_append().unwrap();
        let err = file.append_record(b"").unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::FormatCorruption);
        assert_eq!(file.metrics().snapshot().records_written, 0);
    }

    #[test]
    fn test_delete_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = temp_file(&temp_dir, true);

        file.open_append().unwrap();
        file.close();
        assert!(file.exists());

        file.delete_file();
        assert!(!file.exists());
        file.delete_file();
    }

    #[test]
    fn test_drop_flushes_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.dat");

        {
            let mut file = FramedFile::new(&path, false);
            file.open_append().unwrap();
            file.write(b"pending").unwrap();
        }

        assert_eq!(fs::read(&path).unwrap(), b"pending");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_flush_poisons_later_writes() {
        let mut file = FramedFile::new("/dev/full", false);
        file.open_append().unwrap();

        // Buffered, so the device has not been touched yet.
        file.write(b"x").unwrap();

        let err = file.flush().unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::IoFailure);

        let err = file.write(b"y").unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::IoFailure);
        assert!(err.message().contains("failed state"));
        assert_eq!(file.metrics().snapshot().bytes_written, 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_oversized_write_to_full_device_fails() {
        let mut file = FramedFile::new("/dev/full", false);
        file.open_append().unwrap();

        // Larger than the output buffer, so it goes straight to the device.
        let err = file.write(&vec![0u8; 100_000]).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::IoFailure);
        assert!(err.io_kind().is_some());

        let err = file.append_record(b"after").unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::IoFailure);
        assert_eq!(file.metrics().snapshot().records_written, 0);
    }

    #[test]
    fn test_debug_output() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_file(&temp_dir, true);
        let debug = format!("{:?}", file);
        assert!(debug.contains("FramedFile"));
        assert!(debug.contains("Closed"));
    }
}
