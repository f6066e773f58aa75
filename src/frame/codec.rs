//! Length prefix encoding
//!
//! Pure functions, no I/O. Range checks on decoded lengths belong to the
//! reader, not to this module.

use std::fmt;

/// Width of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Length prefix value that terminates a stream.
pub const END_OF_STREAM_LENGTH: u32 = 0;

/// Encodes a record length as a little-endian prefix.
pub fn encode_length(length: u32) -> [u8; LENGTH_PREFIX_SIZE] {
    length.to_le_bytes()
}

/// Decodes a little-endian length prefix.
pub fn decode_length(prefix: [u8; LENGTH_PREFIX_SIZE]) -> u32 {
    u32::from_le_bytes(prefix)
}

/// Error produced when a payload cannot be framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Payload is empty; a zero length prefix would read back as end of stream
    EmptyPayload,
    /// Payload length is at or above the reader's corruption guard
    PayloadTooLarge {
        /// Length of the rejected payload
        length: usize,
        /// Exclusive upper bound on record length
        max: u32,
    },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::EmptyPayload => write!(f, "cannot frame an empty payload"),
            FrameError::PayloadTooLarge { length, max } => write!(
                f,
                "payload length {} is not below the maximum record length {}",
                length, max
            ),
        }
    }
}

impl std::error::Error for FrameError {}

/// Produces frame prefixes for one file.
///
/// An unframed codec produces no prefix at all, so the same write path
/// serves both record files and plain byte files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    framed: bool,
}

impl FrameCodec {
    /// Create a codec. `framed = false` disables length prefixing.
    pub fn new(framed: bool) -> Self {
        Self { framed }
    }

    /// Returns whether this codec emits length prefixes.
    pub fn is_framed(&self) -> bool {
        self.framed
    }

    /// Returns the prefix to write ahead of a payload of `payload_length` bytes.
    ///
    /// Empty when framing is disabled.
    pub fn frame_for(&self, payload_length: u32) -> Vec<u8> {
        if self.framed {
            encode_length(payload_length).to_vec()
        } else {
            Vec::new()
        }
    }

    /// Builds prefix + payload in one buffer so a record is a single append.
    ///
    /// `max_record_length` is the exclusive bound the reader enforces; a
    /// writer refuses to produce a frame its reader would call corrupt.
    pub fn frame(&self, payload: &[u8], max_record_length: u32) -> Result<Vec<u8>, FrameError> {
        if !self.framed {
            return Ok(payload.to_vec());
        }

        if payload.is_empty() {
            return Err(FrameError::EmptyPayload);
        }

        let length = match u32::try_from(payload.len()) {
            Ok(length) if length < max_record_length => length,
            _ => {
                return Err(FrameError::PayloadTooLarge {
                    length: payload.len(),
                    max: max_record_length,
                })
            }
        };

        let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
        buf.extend_from_slice(&encode_length(length));
        buf.extend_from_slice(payload);
        Ok(buf)
    }
}
