use crate::metrics::{Metrics, Tag};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Elapsed(Duration),
    Count(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub key: String,
    pub value: Value,
    pub tags: Vec<Tag>,
}

impl Measurement {
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }
}

#[derive(Default, Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct InMemoryMetrics {
    measurements: Mutex<Vec<Measurement>>,
}

impl InMemoryMetrics {
    /// Every measurement recorded so far, oldest first.
    pub fn snapshot(&self) -> Vec<Measurement> {
        self.measurements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Measurements recorded under `key`, e.g. `dnsclient.perf.lookup`.
    pub fn find(&self, key: &str) -> Vec<Measurement> {
        self.snapshot()
            .into_iter()
            .filter(|m| m.key == key)
            .collect()
    }

    fn push(&self, key: &[&str], value: Value, tags: &[Tag]) {
        self.measurements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Measurement {
                key: key.join("."),
                value,
                tags: tags.to_vec(),
            });
    }
}

impl Metrics for InMemoryMetrics {
    fn measure_since(&self, key: &[&str], started: Instant, tags: &[Tag]) {
        self.push(key, Value::Elapsed(started.elapsed()), tags);
    }

    fn incr_counter(&self, key: &[&str], value: u64, tags: &[Tag]) {
        self.push(key, Value::Count(value), tags);
    }
}
