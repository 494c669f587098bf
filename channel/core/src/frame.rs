//! Frame Protocol
//!
//! The unit published on a topic. A result stream is a sequence of zero or
//! more `RESULT` frames followed by exactly one terminal frame.
//!
//! # Wire Format
//!
//! ```text
//! { "type": "RESULT", "payload": <value> }
//! { "type": "DONE" }
//! { "type": "ERROR", "message": <string> }
//! ```
//!
//! Frames travel over the transport as raw [`serde_json::Value`] records so
//! that a receiver can observe (and reject) records that do not match any of
//! the shapes above. [`classify`] is the only place that interprets a record.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tag of a result frame
pub const RESULT_TAG: &str = "RESULT";
/// Tag of the successful terminal frame
pub const DONE_TAG: &str = "DONE";
/// Tag of the failed terminal frame
pub const ERROR_TAG: &str = "ERROR";

/// Rendering of the tag when a record carries no `type` at all
const MISSING_TAG: &str = "undefined";

/// A well-formed frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frame {
    /// One produced value
    Result {
        /// The producer's value in wire form
        payload: Value,
    },
    /// The producer finished; nothing follows
    Done,
    /// The producer failed; nothing follows
    Error {
        /// Stringified producer error
        message: String,
    },
}

impl Frame {
    /// Build a result frame from a producer value
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if the value has no JSON representation.
    pub fn result<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Result {
            payload: serde_json::to_value(value)?,
        })
    }

    /// Build an error frame
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Convert into the record published on the transport
    #[must_use]
    pub fn into_wire(self) -> Value {
        match self {
            Self::Result { payload } => json!({ "type": RESULT_TAG, "payload": payload }),
            Self::Done => json!({ "type": DONE_TAG }),
            Self::Error { message } => json!({ "type": ERROR_TAG, "message": message }),
        }
    }
}

impl From<Frame> for Value {
    fn from(frame: Frame) -> Self {
        frame.into_wire()
    }
}

/// Outcome of interpreting a received record
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    /// Deliver the payload to the consumer
    Result(Value),
    /// End the stream cleanly
    Done,
    /// End the stream with the producer's error
    Error(String),
    /// Record matches no known frame; carries the offending tag
    Unknown(String),
}

impl Dispatch {
    /// Whether dispatching this ends the stream
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Result(_))
    }
}

/// Interpret a record received from the transport
///
/// Total over every JSON value: anything that is not a recognized frame
/// becomes [`Dispatch::Unknown`].
#[must_use]
pub fn classify(record: Value) -> Dispatch {
    let Value::Object(mut fields) = record else {
        return Dispatch::Unknown(MISSING_TAG.to_string());
    };

    let tag = match fields.get("type") {
        Some(Value::String(tag)) => tag.clone(),
        Some(other) => return Dispatch::Unknown(other.to_string()),
        None => return Dispatch::Unknown(MISSING_TAG.to_string()),
    };

    match tag.as_str() {
        RESULT_TAG => Dispatch::Result(fields.remove("payload").unwrap_or(Value::Null)),
        DONE_TAG => Dispatch::Done,
        ERROR_TAG => Dispatch::Error(match fields.remove("message") {
            Some(Value::String(message)) => message,
            Some(other) => other.to_string(),
            None => String::new(),
        }),
        _ => Dispatch::Unknown(tag),
    }
}

/// Whether a receiver would stop at `record`
///
/// Agrees with `classify(record).is_terminal()` without consuming the record.
#[must_use]
pub fn ends_stream(record: &Value) -> bool {
    record.get("type").and_then(Value::as_str) != Some(RESULT_TAG)
}
