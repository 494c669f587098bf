//! Topic names
//!
//! A topic identifies one Sender/Receiver pairing on the broadcast transport.
//! The transport does not allocate or namespace topics, so callers must keep
//! them unique per producer; [`Topic::unique`] is the easy way to do that.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque channel identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Wrap an existing topic name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Generate a fresh topic of the form `<prefix>/<uuid>`
    #[must_use]
    pub fn unique(prefix: &str) -> Self {
        Self(format!("{prefix}/{}", Uuid::new_v4()))
    }

    /// Borrow the topic name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&Topic> for Topic {
    fn from(topic: &Topic) -> Self {
        topic.clone()
    }
}
