//! Counters for one framed file
//!
//! - Counters only, monotonic
//! - Atomic, so a shared reference can be read while the owner works

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for a framed file.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    records_written: AtomicU64,
    bytes_written: AtomicU64,
    records_read: AtomicU64,
    bytes_read: AtomicU64,
    corruption_events: AtomicU64,
    bytes_lost: AtomicU64,
    buffer_allocations: AtomicU64,
    buffer_releases: AtomicU64,
}

impl StoreMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful write of `bytes` bytes
    pub fn add_write(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record one framed record appended
    pub fn increment_records_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one record delivered to a reader
    pub fn add_record_read(&self, bytes: u64) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record one corruption outcome and its loss estimate
    pub fn add_corruption(&self, bytes_lost: u64) {
        self.corruption_events.fetch_add(1, Ordering::Relaxed);
        self.bytes_lost.fetch_add(bytes_lost, Ordering::Relaxed);
    }

    /// Record a read buffer allocation
    pub fn increment_buffer_allocations(&self) {
        self.buffer_allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a read buffer release
    pub fn increment_buffer_releases(&self) {
        self.buffer_releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            records_read: self.records_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            corruption_events: self.corruption_events.load(Ordering::Relaxed),
            bytes_lost: self.bytes_lost.load(Ordering::Relaxed),
            buffer_allocations: self.buffer_allocations.load(Ordering::Relaxed),
            buffer_releases: self.buffer_releases.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`StoreMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub records_read: u64,
    pub bytes_read: u64,
    pub corruption_events: u64,
    pub bytes_lost: u64,
    pub buffer_allocations: u64,
    pub buffer_releases: u64,
}

impl MetricsSnapshot {
    /// Serialize the snapshot as one JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
