//! Run context shared by all reporters for a single run.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Clock backing the elapsed-time measurement.
///
/// The system variant measures wall time from the moment the run (or the
/// latest reset) started. The manual variant is advanced explicitly and
/// exists so tests and deterministic drivers can control elapsed time.
enum Clock {
    System(Instant),
    Manual(Duration),
}

impl Clock {
    fn elapsed(&self) -> Duration {
        match self {
            Self::System(started) => started.elapsed(),
            Self::Manual(elapsed) => *elapsed,
        }
    }

    fn restart(&mut self) {
        match self {
            Self::System(started) => *started = Instant::now(),
            Self::Manual(elapsed) => *elapsed = Duration::ZERO,
        }
    }
}

struct Inner {
    clock: Clock,
    iterations: u64,
    tags: HashSet<String>,
}

/// Mutable, run-scoped counters and tags shared across all reporters.
///
/// All reporters read elapsed time and the iteration count; the warm-up
/// reporter is the only component with mutation rights over `reset` and
/// the warm-up tag. The load path drives [`RunInfo::next_iteration`] once
/// per completed unit of work.
pub struct RunInfo {
    inner: RwLock<Inner>,
}

impl RunInfo {
    /// Create a run context measuring wall time from now.
    pub fn new() -> Self {
        Self::with_clock(Clock::System(Instant::now()))
    }

    /// Create a run context with a manually advanced clock.
    pub fn manual() -> Self {
        Self::with_clock(Clock::Manual(Duration::ZERO))
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            inner: RwLock::new(Inner {
                clock,
                iterations: 0,
                tags: HashSet::new(),
            }),
        }
    }

    /// Elapsed run time since start or the latest reset.
    pub fn run_time(&self) -> Duration {
        self.inner.read().clock.elapsed()
    }

    /// Elapsed run time in whole milliseconds.
    pub fn run_time_ms(&self) -> u64 {
        self.run_time().as_millis() as u64
    }

    /// Advance a manual clock. Has no effect on a system clock.
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.write();
        match &mut inner.clock {
            Clock::Manual(elapsed) => *elapsed += by,
            Clock::System(_) => {
                tracing::warn!("advance called on a wall-clock run context, ignoring");
            }
        }
    }

    /// Number of completed iterations.
    pub fn iteration(&self) -> u64 {
        self.inner.read().iterations
    }

    /// Record one completed iteration and return its index (1-based).
    pub fn next_iteration(&self) -> u64 {
        let mut inner = self.inner.write();
        inner.iterations += 1;
        inner.iterations
    }

    /// Zero the elapsed time and iteration count in place.
    ///
    /// Registered reporters and tags are untouched; the run keeps going
    /// from a clean statistical baseline.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.clock.restart();
        inner.iterations = 0;
    }

    /// Add a tag. Idempotent.
    pub fn add_tag(&self, tag: impl Into<String>) {
        self.inner.write().tags.insert(tag.into());
    }

    /// Remove a tag. Idempotent.
    pub fn remove_tag(&self, tag: &str) {
        self.inner.write().tags.remove(tag);
    }

    /// Check whether a tag is present.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.inner.read().tags.contains(tag)
    }
}

impl Default for RunInfo {
    fn default() -> Self {
        Self::new()
    }
}
