//! Shared run-scoped types for the steadyrun measurement core.
//!
//! This crate holds the state that every reporter and the validation
//! manager agree on: the run context ([`RunInfo`]) with its elapsed
//! time, iteration counter and tag set, and the message pair types
//! ([`Message`], [`ReceivedMessage`]) that travel from the send path
//! into the validation queue.

pub mod message;
pub mod run_info;

pub use message::{Message, ReceivedMessage};
pub use run_info::RunInfo;

/// Tag present on the run context while the tested system is warming up.
///
/// Added by the warm-up reporter on `start()` and removed the moment the
/// system is declared warmed.
pub const WARM_UP_TAG: &str = "warmUp";
