//! Warm-up (steady-state) detector.
//!
//! Suppresses real measurement until the tested system's throughput has
//! stabilized, then resets the run statistics to a clean baseline and
//! stops evaluating for the rest of the run.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use steadyrun_core::{RunInfo, WARM_UP_TAG};

use crate::accumulator::{Accumulator, SlidingWindowAvgAccumulator};
use crate::destination::Destination;
use crate::error::ReportingError;
use crate::measurement::{MeasurementUnit, PeriodType};
use crate::reporter::Reporter;

/// Warm-up detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WarmUpConfig {
    /// Minimal warm-up period duration.
    #[serde(with = "duration_millis")]
    pub minimal_duration: Duration,

    /// Minimal iteration count executed during the warm-up period.
    pub minimal_iteration_count: u64,

    /// Relative throughput-change threshold below which the system is
    /// considered stable.
    pub relative_threshold: f64,

    /// Absolute throughput-change threshold below which the system is
    /// considered stable.
    pub absolute_threshold: f64,

    /// Interval between successive stability evaluations.
    #[serde(with = "duration_millis")]
    pub checking_period: Duration,

    /// Number of throughput samples in the comparison window.
    pub window_size: usize,
}

impl Default for WarmUpConfig {
    fn default() -> Self {
        Self {
            minimal_duration: Duration::from_millis(15_000),
            minimal_iteration_count: 10_000,
            relative_threshold: 0.002,
            absolute_threshold: 0.2,
            checking_period: Duration::from_millis(1_000),
            window_size: SlidingWindowAvgAccumulator::DEFAULT_WINDOW_SIZE,
        }
    }
}

impl WarmUpConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimal warm-up duration.
    pub fn with_minimal_duration(mut self, duration: Duration) -> Self {
        self.minimal_duration = duration;
        self
    }

    /// Set the minimal warm-up iteration count.
    pub fn with_minimal_iteration_count(mut self, count: u64) -> Self {
        self.minimal_iteration_count = count;
        self
    }

    /// Set the relative-change threshold.
    pub fn with_relative_threshold(mut self, threshold: f64) -> Self {
        self.relative_threshold = threshold;
        self
    }

    /// Set the absolute-change threshold.
    pub fn with_absolute_threshold(mut self, threshold: f64) -> Self {
        self.absolute_threshold = threshold;
        self
    }

    /// Set the checking period.
    pub fn with_checking_period(mut self, period: Duration) -> Self {
        self.checking_period = period;
        self
    }

    /// Set the throughput history window size.
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }
}

/// State read and written by every evaluation; one lock keeps the whole
/// evaluate-and-mutate sequence atomic across concurrent producers.
struct WarmUpState {
    warmed: bool,
    checking_period_index: u64,
    throughput: SlidingWindowAvgAccumulator,
}

/// Reporter that decides when the tested system is warmed up.
///
/// The system is considered warmed up when all of the following hold: the
/// throughput is not changing much over time (within the configured
/// absolute or relative threshold of the sliding-window average), the
/// minimal iteration count has been executed, and the minimal duration
/// has elapsed. On that moment the run context is reset, the warm-up tag
/// removed, and the detector goes permanently quiet for the run.
///
/// It never publishes anywhere: [`Reporter::publish_result`] always fails.
pub struct WarmUpReporter {
    run_info: Arc<RunInfo>,
    config: WarmUpConfig,
    state: Mutex<WarmUpState>,
}

impl WarmUpReporter {
    /// Create a detector over the given run context.
    pub fn new(run_info: Arc<RunInfo>, config: WarmUpConfig) -> Self {
        let throughput = SlidingWindowAvgAccumulator::new(config.window_size);
        Self {
            run_info,
            config,
            state: Mutex::new(WarmUpState {
                warmed: false,
                checking_period_index: 0,
                throughput,
            }),
        }
    }

    /// The detector's configuration.
    pub fn config(&self) -> &WarmUpConfig {
        &self.config
    }

    /// Whether the tested system has been declared warmed up.
    pub fn is_warmed(&self) -> bool {
        self.state.lock().warmed
    }

    /// Index of the last checking period that was evaluated.
    pub fn checking_period_index(&self) -> u64 {
        self.state.lock().checking_period_index
    }
}

impl Reporter for WarmUpReporter {
    fn start(&self) {
        self.run_info.add_tag(WARM_UP_TAG);
        info!(
            min_duration_ms = self.config.minimal_duration.as_millis() as u64,
            min_iterations = self.config.minimal_iteration_count,
            "Warming the tested system up"
        );
    }

    fn report(&self, _unit: &MeasurementUnit) -> Result<(), ReportingError> {
        let mut state = self.state.lock();
        if state.warmed {
            return Ok(());
        }

        let elapsed_ms = self.run_info.run_time_ms();
        let period_ms = (self.config.checking_period.as_millis() as u64).max(1);
        let period_index = elapsed_ms / period_ms;

        // At most one evaluation per elapsed checking period.
        if period_index <= state.checking_period_index {
            return Ok(());
        }
        state.checking_period_index = period_index;

        let iterations = self.run_info.iteration();
        let current = 1000.0 * iterations as f64 / elapsed_ms as f64;

        if let Some(previous) = state.throughput.result() {
            let rel_delta = (current / previous - 1.0).abs();
            let abs_delta = (current - previous).abs();
            trace!(
                period_index,
                current_throughput = current,
                window_throughput = previous,
                abs_delta,
                rel_delta,
                "Warm-up check"
            );

            if elapsed_ms > self.config.minimal_duration.as_millis() as u64
                && iterations > self.config.minimal_iteration_count
                && (abs_delta < self.config.absolute_threshold
                    || rel_delta < self.config.relative_threshold)
            {
                info!(
                    elapsed_ms,
                    iterations, throughput = current, "The tested system is warmed up"
                );
                self.run_info.reset();
                self.run_info.remove_tag(WARM_UP_TAG);
                state.warmed = true;
                debug!("Run context reset to a clean measurement baseline");
            }
        }

        // The declaring evaluation still records its sample; only later
        // calls skip the accumulator entirely via the warmed guard.
        state.throughput.add(current);
        Ok(())
    }

    fn publish_result(
        &self,
        _period: PeriodType,
        _destination: &mut dyn Destination,
    ) -> Result<(), ReportingError> {
        // Warm-up data must never reach a destination.
        Err(ReportingError::NoDestinationAllowed("WarmUpReporter"))
    }
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
