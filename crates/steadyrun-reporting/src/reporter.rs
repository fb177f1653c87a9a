//! Reporter contract.

use crate::destination::Destination;
use crate::error::ReportingError;
use crate::measurement::{MeasurementUnit, PeriodType};

/// Periodic consumer of work-unit samples.
///
/// The external scheduler calls `start` once before any sample, `report`
/// once per completed unit of work (inline with the measurement path, so
/// implementations must be fast and internally synchronized), and
/// `publish_result` on its own cadence to flush an aggregated
/// [`crate::Measurement`] to a [`Destination`].
pub trait Reporter: Send + Sync {
    /// Called once before the first sample of a run.
    fn start(&self);

    /// Consume one completed work unit.
    fn report(&self, unit: &MeasurementUnit) -> Result<(), ReportingError>;

    /// Flush an aggregated measurement to the given destination.
    fn publish_result(
        &self,
        period: PeriodType,
        destination: &mut dyn Destination,
    ) -> Result<(), ReportingError>;
}
