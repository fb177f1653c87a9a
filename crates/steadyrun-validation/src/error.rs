//! Validation error type.

/// Errors raised by the validation manager and its queue.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The durable response queue could not be created.
    ///
    /// Fatal at manager construction: the manager cannot exist without a
    /// working queue.
    #[error("cannot create the response queue for messages to be validated: {0}")]
    QueueInit(#[source] std::io::Error),

    /// A queue read or write failed at runtime.
    #[error("response queue error: {0}")]
    Queue(String),

    /// The queue binding cannot be replaced while a validation session
    /// is running.
    #[error("the response queue cannot be replaced while validation is running")]
    ValidationRunning,
}
