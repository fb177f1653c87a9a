//! Reporting error type.

/// Errors raised by reporters and destinations.
#[derive(Debug, thiserror::Error)]
pub enum ReportingError {
    /// The reporter refuses to publish to any destination.
    ///
    /// Raised unconditionally by the warm-up reporter: warm-up data must
    /// never reach a destination.
    #[error("no destination is allowed on {0}")]
    NoDestinationAllowed(&'static str),

    /// A destination failed to accept a measurement.
    #[error("destination error: {0}")]
    Destination(String),
}
