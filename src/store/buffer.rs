//! Reusable read buffer
//!
//! Capacity always sits on a multiple of the baseline size class. The
//! buffer grows to fit the largest record seen and is dropped after any
//! read that needed more than the large-buffer threshold, so a single
//! oversized record does not pin that much memory for the rest of the
//! session.
//!
//! Growing only reserves address space. Pages are touched as payload bytes
//! arrive, so a corrupt length prefix does not commit memory the file
//! cannot fill.

use std::io::{self, Read};

use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};

/// Owned, resizable byte buffer used by the sequential reader.
#[derive(Debug)]
pub struct ReadBuffer {
    data: Option<Vec<u8>>,
    /// Baseline multiple reserved for `data`; the allocator may hand out more
    capacity: usize,
    baseline: usize,
    large_threshold: usize,
}

impl ReadBuffer {
    /// Create an unallocated buffer sized by `config`.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            data: None,
            capacity: 0,
            baseline: config.baseline_buffer_size.max(1),
            large_threshold: config.large_buffer_threshold(),
        }
    }

    /// Returns whether memory is currently held.
    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    /// Usable capacity in bytes, 0 when released.
    pub fn capacity(&self) -> usize {
        if self.data.is_some() {
            self.capacity
        } else {
            0
        }
    }

    /// Returns whether the held capacity is above the large-buffer threshold.
    pub fn is_large(&self) -> bool {
        self.capacity() > self.large_threshold
    }

    /// Allocates at baseline capacity if nothing is held.
    ///
    /// Returns `true` when a new allocation was made.
    pub fn ensure_allocated(&mut self) -> StoreResult<bool> {
        if self.data.is_some() {
            return Ok(false);
        }
        self.data = Some(allocate(self.baseline)?);
        self.capacity = self.baseline;
        Ok(true)
    }

    /// Makes room for a `length`-byte record.
    ///
    /// Returns the new capacity when the buffer had to be replaced, `None`
    /// when the current allocation already fits. The old allocation is
    /// dropped before the new one is requested.
    pub fn reserve_for(&mut self, length: usize) -> StoreResult<Option<usize>> {
        if self.data.is_some() && length <= self.capacity() {
            return Ok(None);
        }

        let new_capacity = round_up(length.max(1), self.baseline).ok_or_else(|| {
            StoreError::resource_exhaustion(format!(
                "Buffer size for {} bytes overflows usize",
                length
            ))
        })?;

        self.release();
        self.data = Some(allocate(new_capacity)?);
        self.capacity = new_capacity;
        Ok(Some(new_capacity))
    }

    /// Reads exactly `length` bytes from `reader` into the buffer.
    ///
    /// A stream that ends early is `UnexpectedEof`; the bytes that did
    /// arrive stay in the buffer and are overwritten by the next read. A
    /// buffer that cannot hold `length` bytes is `OutOfMemory`.
    pub fn read_payload<R: Read>(&mut self, reader: &mut R, length: usize) -> io::Result<&[u8]> {
        let data = match self.data.as_mut() {
            Some(data) if length <= self.capacity => data,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    format!("read buffer cannot hold {} bytes", length),
                ))
            }
        };

        data.clear();
        let read = Read::take(&mut *reader, length as u64).read_to_end(data)?;
        if read < length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} payload bytes, got {}", length, read),
            ));
        }
        Ok(&data[..])
    }

    /// Drops the held allocation.
    pub fn release(&mut self) {
        self.data = None;
        self.capacity = 0;
    }
}

/// Smallest multiple of `chunk` that is >= `length`.
fn round_up(length: usize, chunk: usize) -> Option<usize> {
    let chunks = length.checked_add(chunk - 1)? / chunk;
    chunks.checked_mul(chunk)
}

fn allocate(size: usize) -> StoreResult<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(size).map_err(|e| {
        StoreError::resource_exhaustion(format!("Failed to allocate {} byte read buffer: {}", size, e))
    })?;
    Ok(data)
}
