//! Sequential replay of a record file
//!
//! Drives `read_next` from the current position until the stream ends or
//! a frame cannot be read. The file must already be open for reading.
//! Replay stops at the first corruption; it never skips past a bad frame.

use crate::observability::{log_event, Event};

use super::file::FramedFile;
use super::interface::RecordFile;
use super::outcome::{DataLoss, ReadOutcome};

/// Trait for consuming replayed records
pub trait RecordSink {
    /// Consume one payload
    fn apply(&mut self, payload: &[u8]);
}

impl<F: FnMut(&[u8])> RecordSink for F {
    fn apply(&mut self, payload: &[u8]) {
        self(payload)
    }
}

/// Statistics from a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of records delivered to the sink
    pub records_replayed: u64,
    /// Total payload bytes delivered
    pub payload_bytes: u64,
    /// Loss that ended the replay, `None` on a clean end of stream
    pub loss: Option<DataLoss>,
}

impl ReplayStats {
    /// Returns whether the replay reached a clean end of stream.
    pub fn is_clean(&self) -> bool {
        self.loss.is_none()
    }
}

/// Replayer that feeds every readable record to a sink
pub struct RecordReplayer;

impl RecordReplayer {
    /// Replay records from `file` into `sink`.
    pub fn replay<R, S>(file: &mut R, sink: &mut S) -> ReplayStats
    where
        R: RecordFile + ?Sized,
        S: RecordSink + ?Sized,
    {
        let mut stats = ReplayStats::default();

        loop {
            match file.read_next() {
                ReadOutcome::Record(payload) => {
                    sink.apply(&payload);
                    stats.records_replayed += 1;
                    stats.payload_bytes += payload.len() as u64;
                }
                ReadOutcome::EndOfStream => break,
                ReadOutcome::Corruption(loss) => {
                    stats.loss = Some(loss);
                    break;
                }
            }
        }

        let path = file.path().display().to_string();
        let records = stats.records_replayed.to_string();
        let lost = stats.loss.map_or(0, |l| l.bytes).to_string();
        log_event(
            Event::ReplayComplete,
            &[
                ("bytes_lost", lost.as_str()),
                ("path", path.as_str()),
                ("records", records.as_str()),
            ],
        );

        stats
    }
}

/// Iterator over the remaining records of a framed file.
///
/// Stops at end of stream or at the first corruption; the loss, if any,
/// is kept for the caller.
pub struct Records<'a> {
    file: &'a mut FramedFile,
    loss: Option<DataLoss>,
    done: bool,
}

impl<'a> Records<'a> {
    /// Returns the loss that ended iteration, if any.
    pub fn loss(&self) -> Option<&DataLoss> {
        self.loss.as_ref()
    }

    /// Consumes the iterator and returns the loss, if any.
    pub fn into_loss(self) -> Option<DataLoss> {
        self.loss
    }
}

impl Iterator for Records<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.file.read_next() {
            ReadOutcome::Record(payload) => Some(payload),
            ReadOutcome::EndOfStream => {
                self.done = true;
                None
            }
            ReadOutcome::Corruption(loss) => {
                self.loss = Some(loss);
                self.done = true;
                None
            }
        }
    }
}

impl FramedFile {
    /// Iterates over the remaining records.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            file: self,
            loss: None,
            done: false,
        }
    }
}
