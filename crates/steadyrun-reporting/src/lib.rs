//! Measurement reporting core: accumulators, reporter/destination
//! contracts, and the warm-up (steady-state) detector.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        load path                            │
//! │   (completes work units, produces MeasurementUnits)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  report(mu)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WarmUpReporter                         │
//! │  (gates on checking periods, compares throughput against    │
//! │   a sliding-window average, resets RunInfo once warmed)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  publish_result(..)
//!                              ▼
//!                     always rejected — warm-up data
//!                     never reaches a Destination
//! ```

pub mod accumulator;
pub mod destination;
pub mod error;
pub mod measurement;
pub mod reporter;
pub mod warmup;

pub use accumulator::{Accumulator, AvgAccumulator, LastValueAccumulator, SlidingWindowAvgAccumulator};
pub use destination::Destination;
pub use error::ReportingError;
pub use measurement::{Measurement, MeasurementUnit, PeriodType};
pub use reporter::Reporter;
pub use warmup::{WarmUpConfig, WarmUpReporter};
