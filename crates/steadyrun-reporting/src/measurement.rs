//! Measurement data model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of reporting period driving a scheduled publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    /// Publish every N milliseconds of run time.
    Time,
    /// Publish every N completed iterations.
    Iteration,
    /// Publish every N percent of overall progress.
    Percentage,
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Time => write!(f, "time"),
            Self::Iteration => write!(f, "iteration"),
            Self::Percentage => write!(f, "percentage"),
        }
    }
}

/// One completed iteration's timing and result data.
///
/// Produced by the load path when a unit of work finishes; immutable once
/// produced. Reporters consume these through [`crate::Reporter::report`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementUnit {
    iteration: u64,
    started_at: DateTime<Utc>,
    stopped_at: DateTime<Utc>,
    results: BTreeMap<String, serde_json::Value>,
}

impl MeasurementUnit {
    /// Create a unit for the given iteration index with its start/stop times.
    pub fn new(iteration: u64, started_at: DateTime<Utc>, stopped_at: DateTime<Utc>) -> Self {
        Self {
            iteration,
            started_at,
            stopped_at,
            results: BTreeMap::new(),
        }
    }

    /// Attach a named result value.
    pub fn with_result(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.results.insert(name.into(), value);
        self
    }

    /// Iteration index this unit belongs to.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Wall time this unit took, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        (self.stopped_at - self.started_at).num_microseconds().unwrap_or(0) as f64 / 1000.0
    }

    /// Named result value, if present.
    pub fn result(&self, name: &str) -> Option<&serde_json::Value> {
        self.results.get(name)
    }
}

/// A named snapshot of aggregated results produced by a reporter on publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Elapsed run time at the moment of the snapshot, in milliseconds.
    time_ms: u64,
    /// Iteration count at the moment of the snapshot.
    iteration: u64,
    results: BTreeMap<String, serde_json::Value>,
}

impl Measurement {
    /// Key under which a reporter stores its main result value.
    pub const DEFAULT_RESULT: &'static str = "Result";

    /// Create an empty measurement snapshot.
    pub fn new(time_ms: u64, iteration: u64) -> Self {
        Self {
            time_ms,
            iteration,
            results: BTreeMap::new(),
        }
    }

    /// Store a named result value.
    pub fn set(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.results.insert(name.into(), value);
    }

    /// Store the default result value.
    pub fn set_default(&mut self, value: serde_json::Value) {
        self.set(Self::DEFAULT_RESULT, value);
    }

    /// Elapsed run time at snapshot, in milliseconds.
    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    /// Iteration count at snapshot.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Named result value, if present.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.results.get(name)
    }

    /// The default result value, if present.
    pub fn get_default(&self) -> Option<&serde_json::Value> {
        self.get(Self::DEFAULT_RESULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_unit_duration() {
        let start = Utc::now();
        let stop = start + chrono::Duration::milliseconds(250);
        let mu = MeasurementUnit::new(1, start, stop);
        assert_eq!(mu.duration_ms(), 250.0);
    }

    #[test]
    fn test_measurement_default_result() {
        let mut m = Measurement::new(1000, 42);
        m.set_default(serde_json::json!(123.4));
        assert_eq!(m.get_default(), Some(&serde_json::json!(123.4)));
        assert_eq!(m.get(Measurement::DEFAULT_RESULT), m.get_default());
    }
}
