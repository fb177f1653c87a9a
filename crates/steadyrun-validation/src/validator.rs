//! Validator capability contract.

use steadyrun_core::Message;

/// A capability that judges a captured response.
///
/// Concrete validators (pattern matching, schema checks, ...) live
/// outside this crate; the manager only relies on this contract. A
/// message may declare zero or more validators, invoked in declaration
/// order against each captured response.
pub trait MessageValidator: Send + Sync {
    /// Judge the response payload captured for the given original message.
    fn is_valid(&self, original: &Message, response: &str) -> bool;
}
