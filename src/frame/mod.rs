//! Frame codec for framestore
//!
//! A frame is one record on disk:
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE)
//! +------------------+
//! | Payload          | (Record Length bytes)
//! +------------------+
//! ```
//!
//! A stream is a sequence of frames optionally followed by a terminator,
//! a length field of zero. Missing bytes at the end also mean end of stream.
//!
//! # Byte Order
//!
//! The length field is little-endian. This is part of the on-disk format
//! and must never change between writers and readers of the same file.

mod codec;

pub use codec::{
    decode_length, encode_length, FrameCodec, FrameError, END_OF_STREAM_LENGTH,
    LENGTH_PREFIX_SIZE,
};
