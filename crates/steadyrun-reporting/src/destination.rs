//! Destination contract for published measurements.

use crate::error::ReportingError;
use crate::measurement::Measurement;

/// A channel measurements are published to (console, CSV, chart, ...).
///
/// Destinations are registered with reporters and fully controlled by
/// them: `open` once before first use, `report` any number of times,
/// `close` once at shutdown. Concrete destinations live outside this
/// crate; tests use in-memory doubles.
pub trait Destination: Send {
    /// Open the destination for reporting.
    fn open(&mut self);

    /// Publish one measurement.
    fn report(&mut self, measurement: &Measurement) -> Result<(), ReportingError>;

    /// Close the destination. Nothing may be reported afterwards.
    fn close(&mut self);
}
