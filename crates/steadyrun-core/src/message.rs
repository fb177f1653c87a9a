//! Message pair types traveling from the send path into validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An outbound message as handed to a sender.
///
/// Carries the payload, optional headers, and the ids of the validators
/// declared for it, in declaration order. Validator ids (rather than
/// validator instances) keep the message serializable so responses can sit
/// in a durable queue between capture and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    payload: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    validator_ids: Vec<String>,
}

impl Message {
    /// Create a message with the given payload and no validators.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            headers: BTreeMap::new(),
            validator_ids: Vec::new(),
        }
    }

    /// Declare a validator for this message. Order of declaration is the
    /// order of invocation.
    pub fn with_validator(mut self, validator_id: impl Into<String>) -> Self {
        self.validator_ids.push(validator_id.into());
        self
    }

    /// Set a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The message payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Header value, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Ids of the validators declared for this message, in declaration order.
    pub fn validator_ids(&self) -> &[String] {
        &self.validator_ids
    }
}

/// A captured response paired with the message that produced it.
///
/// Immutable once created; this is the unit stored in the validation queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    message: Message,
    response: String,
}

impl ReceivedMessage {
    /// Pair a sent message with its raw response payload.
    pub fn new(message: Message, response: impl Into<String>) -> Self {
        Self {
            message,
            response: response.into(),
        }
    }

    /// The original outbound message.
    pub fn sent_message(&self) -> &Message {
        &self.message
    }

    /// The raw response payload.
    pub fn response(&self) -> &str {
        &self.response
    }
}
