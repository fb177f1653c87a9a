//! Running aggregates over reported result values.

use std::collections::VecDeque;

/// A mutable running aggregate over a stream of samples.
///
/// Implementations must be cheap to feed from the measurement path; the
/// reporter owning the accumulator provides any synchronization.
pub trait Accumulator: Send {
    /// Feed one sample into the aggregate.
    fn add(&mut self, value: f64);

    /// Current aggregated value, or `None` before the first sample.
    fn result(&self) -> Option<f64>;

    /// Drop all accumulated state.
    fn reset(&mut self);
}

/// Arithmetic mean over the most recent N samples.
///
/// Holds a fixed-capacity ring of samples; once full, the oldest sample is
/// evicted on each insert (strict FIFO). Capacity is fixed at construction.
pub struct SlidingWindowAvgAccumulator {
    window: VecDeque<f64>,
    capacity: usize,
}

impl SlidingWindowAvgAccumulator {
    /// Default window size.
    pub const DEFAULT_WINDOW_SIZE: usize = 16;

    /// Create an accumulator averaging the last `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether no samples have been fed yet.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for SlidingWindowAvgAccumulator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW_SIZE)
    }
}

impl Accumulator for SlidingWindowAvgAccumulator {
    fn add(&mut self, value: f64) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(value);
    }

    fn result(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}

/// Arithmetic mean over all samples seen so far.
pub struct AvgAccumulator {
    sum: f64,
    count: u64,
}

impl AvgAccumulator {
    /// Create an empty running average.
    pub fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }
}

impl Default for AvgAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator for AvgAccumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn result(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum / self.count as f64)
    }

    fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

/// Keeps only the most recent sample.
#[derive(Default)]
pub struct LastValueAccumulator {
    last: Option<f64>,
}

impl LastValueAccumulator {
    /// Create an empty last-value accumulator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for LastValueAccumulator {
    fn add(&mut self, value: f64) {
        self.last = Some(value);
    }

    fn result(&self) -> Option<f64> {
        self.last
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sliding_window_empty_has_no_result() {
        let acc = SlidingWindowAvgAccumulator::new(4);
        assert_eq!(acc.result(), None);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_sliding_window_partial_fill() {
        let mut acc = SlidingWindowAvgAccumulator::new(4);
        acc.add(1.0);
        acc.add(3.0);
        assert_eq!(acc.result(), Some(2.0));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn test_sliding_window_evicts_oldest() {
        let mut acc = SlidingWindowAvgAccumulator::new(3);
        for v in [1.0, 2.0, 3.0, 10.0] {
            acc.add(v);
        }
        // 1.0 evicted; mean of [2, 3, 10]
        assert_eq!(acc.result(), Some(5.0));
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_sliding_window_reset() {
        let mut acc = SlidingWindowAvgAccumulator::default();
        acc.add(5.0);
        acc.reset();
        assert_eq!(acc.result(), None);
    }

    #[test]
    fn test_default_window_size() {
        let mut acc = SlidingWindowAvgAccumulator::default();
        for i in 0..100 {
            acc.add(i as f64);
        }
        // mean of 84..=99
        assert_eq!(acc.result(), Some(91.5));
    }

    #[test]
    fn test_avg_accumulator() {
        let mut acc = AvgAccumulator::new();
        assert_eq!(acc.result(), None);
        acc.add(2.0);
        acc.add(4.0);
        acc.add(6.0);
        assert_eq!(acc.result(), Some(4.0));
    }

    #[test]
    fn test_last_value_accumulator() {
        let mut acc = LastValueAccumulator::new();
        assert_eq!(acc.result(), None);
        acc.add(1.0);
        acc.add(7.0);
        assert_eq!(acc.result(), Some(7.0));
        acc.reset();
        assert_eq!(acc.result(), None);
    }
}
