//! Transport Traits
//!
//! The broadcast primitive the result channel is layered on. A transport
//! delivers every published message to every subscriber that is attached to
//! the topic at publish time, in the publisher's order. It makes no promise
//! about messages published before a subscription attached.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Callback invoked for each message delivered to a subscription
pub type MessageHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Shared handle to a transport, as held by senders and receivers
pub type SharedTransport = Arc<dyn BroadcastTransport>;

/// Topic-keyed fan-out publish/subscribe
pub trait BroadcastTransport: Send + Sync {
    /// Deliver `message` to all current subscribers of `topic`
    ///
    /// Publishing to a topic with no subscribers is not an error; the
    /// message is simply not delivered anywhere.
    fn publish(&self, topic: &str, message: Value);

    /// Attach `handler` to `topic` until the returned [`Subscription`] is
    /// released
    fn subscribe(&self, topic: &str, handler: MessageHandler) -> Subscription;
}

/// Handle to an active subscription
///
/// Releasing it (explicitly with [`Subscription::unsubscribe`] or by dropping
/// it) detaches the handler. Releasing twice is a no-op.
pub struct Subscription {
    topic: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription whose release runs `release`
    pub fn new(topic: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            topic: topic.into(),
            release: Some(Box::new(release)),
        }
    }

    /// Topic this subscription is attached to
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether the subscription has not been released yet
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Detach the handler from the transport
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}
