//! Sequential frame reader with loss accounting
//!
//! Each call to `read_next` decodes exactly one frame:
//!
//! 1. Make sure the read buffer exists (baseline capacity)
//! 2. Read the 4-byte length prefix; EOF or a zero length ends the stream
//! 3. Reject lengths at or above `max_record_length`
//! 4. Grow the buffer to a baseline multiple if needed, unless the file is
//!    too short to hold the declared length
//! 5. Read the payload
//! 6. Drop the buffer if it is above the large-buffer threshold
//!
//! Any failure in steps 1, 3, 4 or 5 is reported as a `Corruption` carrying
//! the number of bytes from the start of the failing frame to the end of
//! the file. The reader does not skip ahead or resynchronize; the next call
//! continues from wherever the stream was left.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use crate::frame::{decode_length, END_OF_STREAM_LENGTH, LENGTH_PREFIX_SIZE};
use crate::observability::{log_event, Event, StoreMetrics};

use super::buffer::ReadBuffer;
use super::config::StoreConfig;
use super::file::{FramedFile, Handle};
use super::fs::{file_size_of, log_path_error};
use super::outcome::{DataLoss, LossReason, ReadOutcome};

impl FramedFile {
    /// Reads the next record.
    ///
    /// Never fails with an `Err`: end of data is `EndOfStream`, and every
    /// I/O, format or allocation problem is `Corruption` with a loss
    /// estimate. On a short payload read the partial bytes are discarded.
    pub fn read_next(&mut self) -> ReadOutcome {
        match &mut self.handle {
            Handle::Reader(reader) => FrameReader {
                reader,
                buffer: &mut self.buffer,
                config: &self.config,
                metrics: &self.metrics,
                path: &self.path,
            }
            .next_frame(),
            _ => {
                log_path_error(Event::DataLoss, &self.path, &"not open for reading");
                let loss = DataLoss::at(file_size_of(&self.path), None, LossReason::NotOpen);
                self.metrics.add_corruption(loss.bytes);
                ReadOutcome::Corruption(loss)
            }
        }
    }
}

struct FrameReader<'a> {
    reader: &'a mut BufReader<File>,
    buffer: &'a mut ReadBuffer,
    config: &'a StoreConfig,
    metrics: &'a StoreMetrics,
    path: &'a Path,
}

impl FrameReader<'_> {
    fn next_frame(&mut self) -> ReadOutcome {
        let frame_start = self.reader.stream_position().ok();

        match self.buffer.ensure_allocated() {
            Ok(true) => self.metrics.increment_buffer_allocations(),
            Ok(false) => {}
            Err(e) => {
                log_path_error(Event::BufferAllocFailed, self.path, &e);
                return self.loss(frame_start, LossReason::BufferExhausted);
            }
        }

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        match read_up_to(&mut *self.reader, &mut prefix) {
            Ok(0) => return ReadOutcome::EndOfStream,
            Ok(n) if n < LENGTH_PREFIX_SIZE => {
                let path = self.path.display().to_string();
                let torn = n.to_string();
                log_event(
                    Event::TornLengthPrefix,
                    &[("path", path.as_str()), ("bytes", torn.as_str())],
                );
                return ReadOutcome::EndOfStream;
            }
            Ok(_) => {}
            Err(_) => return self.loss(frame_start, LossReason::ReadError),
        }

        let length = decode_length(prefix);
        if length == END_OF_STREAM_LENGTH {
            return ReadOutcome::EndOfStream;
        }

        if length >= self.config.max_record_length {
            return self.loss(frame_start, LossReason::LengthOverflow);
        }

        let length = length as usize;
        if length > self.buffer.capacity() && !self.fits_in_file(frame_start, length) {
            return self.loss(frame_start, LossReason::ShortRead);
        }

        match self.buffer.reserve_for(length) {
            Ok(Some(capacity)) => {
                self.metrics.increment_buffer_allocations();
                if capacity > self.config.large_buffer_threshold() {
                    let path = self.path.display().to_string();
                    let capacity = capacity.to_string();
                    log_event(
                        Event::LargeBufferAllocated,
                        &[("capacity", capacity.as_str()), ("path", path.as_str())],
                    );
                }
            }
            Ok(None) => {}
            Err(e) => {
                log_path_error(Event::BufferAllocFailed, self.path, &e);
                return self.loss(frame_start, LossReason::BufferExhausted);
            }
        }

        let outcome = match self.buffer.read_payload(&mut *self.reader, length) {
            Ok(payload) => {
                self.metrics.add_record_read(length as u64);
                ReadOutcome::Record(payload.to_vec())
            }
            Err(e) => {
                let reason = match e.kind() {
                    io::ErrorKind::UnexpectedEof => LossReason::ShortRead,
                    io::ErrorKind::OutOfMemory => LossReason::BufferExhausted,
                    _ => LossReason::ReadError,
                };
                self.loss(frame_start, reason)
            }
        };

        if self.buffer.is_large() {
            self.buffer.release();
            self.metrics.increment_buffer_releases();
        }

        outcome
    }

    /// Whether the bytes after this frame's prefix could hold `length`.
    ///
    /// Checked before growing so a corrupt prefix never reserves more than
    /// the file holds. An unknown offset skips the check.
    fn fits_in_file(&self, frame_start: Option<u64>, length: usize) -> bool {
        match frame_start {
            Some(start) => {
                let payload_start = start + LENGTH_PREFIX_SIZE as u64;
                let available = file_size_of(self.path).saturating_sub(payload_start);
                length as u64 <= available
            }
            None => true,
        }
    }

    fn loss(&self, frame_start: Option<u64>, reason: LossReason) -> ReadOutcome {
        let loss = DataLoss::at(file_size_of(self.path), frame_start, reason);

        let path = self.path.display().to_string();
        let bytes = loss.bytes.to_string();
        let offset = frame_start.map_or_else(|| "unknown".to_string(), |o| o.to_string());
        log_event(
            Event::DataLoss,
            &[
                ("bytes", bytes.as_str()),
                ("offset", offset.as_str()),
                ("path", path.as_str()),
                ("reason", reason.as_str()),
            ],
        );

        self.metrics.add_corruption(loss.bytes);
        ReadOutcome::Corruption(loss)
    }
}

/// Reads until `buf` is full or the stream ends. Returns the bytes read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
