//! In-Process Bus
//!
//! Reference [`BroadcastTransport`] for producers and consumers living in the
//! same process.
//!
//! # Usage
//!
//! ```ignore
//! let bus: SharedTransport = Arc::new(InProcessBus::new());
//!
//! let receiver = Receiver::<String>::new(Arc::clone(&bus), "jobs/1");
//! Sender::new(bus, "jobs/1").spawn(producer);
//! ```
//!
//! # Delivery
//!
//! Handlers run synchronously inside `publish`, in subscription order, so a
//! single publisher's messages reach each subscriber in send order. Handlers
//! are cloned out of the lock before they run, which lets a handler publish
//! or (un)subscribe without deadlocking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;

use super::traits::{BroadcastTransport, MessageHandler, Subscription};

/// Subscriber entry for one topic
struct SubscriberEntry {
    id: u64,
    handler: MessageHandler,
}

type TopicTable = HashMap<String, Vec<SubscriberEntry>>;

/// In-memory topic bus
pub struct InProcessBus {
    topics: Arc<RwLock<TopicTable>>,
    next_id: AtomicU64,
}

impl Default for InProcessBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessBus {
    /// Create an empty bus
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of active subscribers on `topic`
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, Vec::len)
    }

    /// Number of topics with at least one subscriber
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }

    fn remove_subscriber(topics: &Weak<RwLock<TopicTable>>, topic: &str, id: u64) {
        let Some(topics) = topics.upgrade() else {
            return;
        };
        let mut table = topics.write();
        if let Some(entries) = table.get_mut(topic) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                table.remove(topic);
                tracing::trace!(topic, "Last subscriber left, topic dropped");
            }
        }
    }
}

impl BroadcastTransport for InProcessBus {
    fn publish(&self, topic: &str, message: Value) {
        let handlers: Vec<MessageHandler> = match self.topics.read().get(topic) {
            Some(entries) => entries.iter().map(|e| Arc::clone(&e.handler)).collect(),
            None => {
                tracing::trace!(topic, "Publish with no subscribers");
                return;
            }
        };

        // Last handler takes ownership; the rest get clones
        let mut handlers = handlers.into_iter().peekable();
        while let Some(handler) = handlers.next() {
            if handlers.peek().is_some() {
                handler(message.clone());
            } else {
                handler(message);
                break;
            }
        }
    }

    fn subscribe(&self, topic: &str, handler: MessageHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.topics
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(SubscriberEntry { id, handler });

        tracing::trace!(topic, subscriber = id, "Subscriber attached");

        let topics = Arc::downgrade(&self.topics);
        let owned_topic = topic.to_string();
        Subscription::new(topic, move || {
            Self::remove_subscriber(&topics, &owned_topic, id);
        })
    }
}
