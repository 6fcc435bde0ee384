//! A [`Metrics`][super::Metrics] sink that writes measurements to the `tracing` log.
use crate::metrics::{Metrics, Tag};
use std::time::Instant;

/// Emits each measurement as a `debug` event on the `dnsclient::metrics` target. This is the
/// default sink for a [`Client`][crate::dns::Client].
#[derive(Default, Debug, Clone, Copy)]
#[allow(clippy::module_name_repetitions)]
pub struct LogMetrics;

fn render(tags: &[Tag]) -> String {
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl Metrics for LogMetrics {
    fn measure_since(&self, key: &[&str], started: Instant, tags: &[Tag]) {
        tracing::debug!(
            target: "dnsclient::metrics",
            key = %key.join("."),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            tags = %render(tags),
        );
    }

    fn incr_counter(&self, key: &[&str], value: u64, tags: &[Tag]) {
        tracing::debug!(
            target: "dnsclient::metrics",
            key = %key.join("."),
            value,
            tags = %render(tags),
        );
    }
}
