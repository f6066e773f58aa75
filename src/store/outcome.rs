//! Result of one sequential read
//!
//! A read yields exactly one of three things: a record, a clean end of
//! stream, or a data loss report. Loss is never folded into a byte count
//! and never raised as an `Err`.

use std::fmt;

/// Loss reported when the read offset lies beyond the end of the file.
///
/// A positive offset past EOF means the offset itself is untrustworthy, so
/// no exact figure can be given.
pub const LOSS_SENTINEL: u64 = 1_000_000_000;

/// Outcome of [`FramedFile::read_next`](super::FramedFile::read_next).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One complete payload
    Record(Vec<u8>),
    /// End of file, or a zero length prefix
    EndOfStream,
    /// Bytes from the current frame onwards cannot be read
    Corruption(DataLoss),
}

impl ReadOutcome {
    /// Returns whether this outcome carries a record.
    pub fn is_record(&self) -> bool {
        matches!(self, ReadOutcome::Record(_))
    }

    /// Returns whether this outcome is a clean end of stream.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReadOutcome::EndOfStream)
    }

    /// Consumes the outcome, returning the payload if there is one.
    pub fn into_record(self) -> Option<Vec<u8>> {
        match self {
            ReadOutcome::Record(payload) => Some(payload),
            _ => None,
        }
    }

    /// Returns the loss report, if this outcome is a corruption.
    pub fn loss(&self) -> Option<&DataLoss> {
        match self {
            ReadOutcome::Corruption(loss) => Some(loss),
            _ => None,
        }
    }
}

/// Why a read could not produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    /// The file was not open for reading
    NotOpen,
    /// The read buffer could not be allocated or grown
    BufferExhausted,
    /// Length prefix at or above the maximum record length
    LengthOverflow,
    /// Fewer payload bytes than the prefix declared
    ShortRead,
    /// The OS reported an error other than end of file
    ReadError,
}

impl LossReason {
    /// Returns the string representation used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            LossReason::NotOpen => "not_open",
            LossReason::BufferExhausted => "buffer_exhausted",
            LossReason::LengthOverflow => "length_overflow",
            LossReason::ShortRead => "short_read",
            LossReason::ReadError => "read_error",
        }
    }
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quantified data loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLoss {
    /// Bytes presumed unrecoverable by this reader
    pub bytes: u64,
    /// What went wrong
    pub reason: LossReason,
    /// Offset of the frame where reading stopped, when known
    pub offset: Option<u64>,
}

impl DataLoss {
    /// Builds a loss report for a read that stopped at `offset`.
    pub fn at(file_size: u64, offset: Option<u64>, reason: LossReason) -> Self {
        Self {
            bytes: estimate_loss(file_size, offset),
            reason,
            offset,
        }
    }
}

impl fmt::Display for DataLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes lost ({})", self.bytes, self.reason)?;
        if let Some(offset) = self.offset {
            write!(f, " at offset {}", offset)?;
        }
        Ok(())
    }
}

/// Bytes from `offset` to the end of a `file_size`-byte file.
///
/// An unknown offset counts the whole file as lost. An offset past the end
/// yields [`LOSS_SENTINEL`].
pub fn estimate_loss(file_size: u64, offset: Option<u64>) -> u64 {
    match offset {
        Some(offset) if offset <= file_size => file_size - offset,
        Some(_) => LOSS_SENTINEL,
        None => file_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_remaining_bytes() {
        assert_eq!(estimate_loss(100, Some(40)), 60);
        assert_eq!(estimate_loss(100, Some(100)), 0);
    }

    #[test]
    fn test_estimate_unknown_offset_is_whole_file() {
        assert_eq!(estimate_loss(100, None), 100);
    }

    #[test]
    fn test_estimate_offset_past_end_is_sentinel() {
        assert_eq!(estimate_loss(100, Some(101)), LOSS_SENTINEL);
    }

    #[test]
    fn test_outcome_accessors() {
        let record = ReadOutcome::Record(b"x".to_vec());
        assert!(record.is_record());
        assert!(record.loss().is_none());
        assert_eq!(record.into_record(), Some(b"x".to_vec()));

        assert!(ReadOutcome::EndOfStream.is_end_of_stream());
        assert_eq!(ReadOutcome::EndOfStream.into_record(), None);

        let loss = DataLoss::at(10, Some(4), LossReason::ShortRead);
        let corruption = ReadOutcome::Corruption(loss);
        assert_eq!(corruption.loss().map(|l| l.bytes), Some(6));
    }

    #[test]
    fn test_loss_display() {
        let loss = DataLoss::at(10, Some(4), LossReason::LengthOverflow);
        assert_eq!(loss.to_string(), "6 bytes lost (length_overflow) at offset 4");
    }
}
