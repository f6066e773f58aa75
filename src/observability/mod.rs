//! Observability subsystem for framestore
//!
//! This module is the logging sink the store reports into:
//! - Structured logging (JSON lines)
//! - Typed store events
//! - Per-file counters
//!
//! Observability is read-only. Nothing here changes store control flow,
//! and a failure to log is never reported back to the store.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, StoreMetrics};

/// Log a store event at its default severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
