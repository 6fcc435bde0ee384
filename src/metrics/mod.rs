//! Resolver telemetry.
//!
//! The resolver reports timings and counters to a [`Metrics`] sink handed to it at
//! construction time. Two implementations are provided, [`log::LogMetrics`] and
//! [`memory::InMemoryMetrics`]. The former renders every measurement as a `tracing` event.
//! The latter keeps them in memory so they can be inspected later.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

pub mod log;
pub mod memory;

pub use log::LogMetrics;
pub use memory::InMemoryMetrics;

/// Timer for a whole logical lookup, across every attempt.
pub const KEY_TOTAL_LOOKUP: &[&str] = &["dnsclient", "perf", "lookup"];
/// Timer for a single exchange with one server.
pub const KEY_QUERY: &[&str] = &["dnsclient", "perf", "query"];
/// Counter of lookups ended by cancellation or deadline.
pub const KEY_TIMEOUT_COUNTER: &[&str] = &["dnsclient", "timeout", "query"];

/// `SharedMetrics` is a [`Metrics`] sink that may be shared by any number of resolvers.
pub type SharedMetrics = Arc<dyn Metrics>;

/// A name/value pair attached to a measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: &'static str,
    pub value: String,
}

impl Tag {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// A sink accepting named, tagged measurements.
pub trait Metrics: Send + Sync {
    /// Record the time elapsed since `started` under `key`.
    fn measure_since(&self, key: &[&str], started: Instant, tags: &[Tag]);

    /// Add `value` to the counter named `key`.
    fn incr_counter(&self, key: &[&str], value: u64, tags: &[Tag]);
}
