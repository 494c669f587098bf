//! Result Receiver
//!
//! Consumer side of a result channel. A receiver subscribes the moment it is
//! constructed and queues every frame until the consumer pulls it, so values
//! published before iteration starts are never lost.
//!
//! # State Machine
//!
//! ```text
//!   new() ──▶ Pending ──first poll──▶ Iterating ──terminal frame──▶ Closed
//!                │                                                   ▲
//!                └──────────────────── close() ──────────────────────┘
//! ```
//!
//! Frames queued before the first poll and frames arriving while a poll is
//! waiting take the same path: both are pulled off one unbounded channel and
//! interpreted by [`classify`]. Once closed, the subscription is released,
//! anything still queued is discarded, and the stream yields `None` forever.

use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::ReceiverConfig;
use crate::error::ChannelError;
use crate::frame::{classify, Dispatch};
use crate::topic::Topic;
use crate::transport::{SharedTransport, Subscription};

/// Lifecycle of a [`Receiver`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiverState {
    /// Subscribed, nobody has pulled yet; frames are queued
    Pending,
    /// A consumer is pulling values
    Iterating,
    /// A terminal outcome was delivered (or the receiver was closed); the
    /// subscription is released
    Closed,
}

/// Queue depth shared between the subscription handler and the receiver
#[derive(Debug, Default)]
struct QueueDepth {
    depth: AtomicUsize,
    warned: AtomicBool,
}

impl QueueDepth {
    fn decrement(&self) {
        // Saturating: close() may have reset the count concurrently
        let _ = self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| Some(d.saturating_sub(1)));
    }
}

/// Consumer side of a result channel
///
/// Implements [`Stream`] of `Result<T, ChannelError>`. The stream is
/// single-pass: it ends after the first `DONE`, or after yielding exactly one
/// error.
///
/// A receiver whose consumer stops pulling keeps its subscription and queue
/// until it is dropped or [`Receiver::close`] is called.
pub struct Receiver<T> {
    topic: Topic,
    queue: mpsc::UnboundedReceiver<Value>,
    depth: Arc<QueueDepth>,
    subscription: Option<Subscription>,
    state: ReceiverState,
    delivered: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Receiver<T> {
    /// Subscribe to `topic` with default diagnostics
    pub fn new(transport: SharedTransport, topic: impl Into<Topic>) -> Self {
        Self::with_config(transport, topic, &ReceiverConfig::default())
    }

    /// Subscribe to `topic`
    pub fn with_config(
        transport: SharedTransport,
        topic: impl Into<Topic>,
        config: &ReceiverConfig,
    ) -> Self {
        let topic = topic.into();
        let (tx, queue) = mpsc::unbounded_channel();
        let depth = Arc::new(QueueDepth::default());

        let handler_depth = Arc::clone(&depth);
        let handler_topic = topic.clone();
        let warn_at = config.queue_warn_depth;
        let subscription = transport.subscribe(
            topic.as_str(),
            Arc::new(move |message: Value| {
                // Count before sending so the consumer never decrements first
                let queued = handler_depth.depth.fetch_add(1, Ordering::SeqCst) + 1;
                // Send fails only after close(); late frames are dropped
                if tx.send(message).is_err() {
                    handler_depth.decrement();
                    tracing::trace!(topic = %handler_topic, "Frame after close ignored");
                    return;
                }
                if queued >= warn_at && !handler_depth.warned.swap(true, Ordering::SeqCst) {
                    tracing::warn!(
                        topic = %handler_topic,
                        queued,
                        "Receiver queue is growing; is the consumer pulling?"
                    );
                }
            }),
        );

        tracing::debug!(topic = %topic, "Receiver subscribed");

        Self {
            topic,
            queue,
            depth,
            subscription: Some(subscription),
            state: ReceiverState::Pending,
            delivered: 0,
            _marker: PhantomData,
        }
    }
}

impl<T> Receiver<T> {
    /// Topic this receiver listens on
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Frames received but not yet pulled
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.depth.depth.load(Ordering::SeqCst)
    }

    /// Number of values yielded so far
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Release the subscription and discard anything queued
    ///
    /// The stream yields nothing further. Closing an already closed receiver
    /// does nothing.
    pub fn close(&mut self) {
        if self.state == ReceiverState::Closed {
            return;
        }
        self.state = ReceiverState::Closed;

        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.queue.close();

        let mut discarded = 0usize;
        while self.queue.try_recv().is_ok() {
            discarded += 1;
        }
        self.depth.depth.store(0, Ordering::SeqCst);

        tracing::debug!(
            topic = %self.topic,
            delivered = self.delivered,
            discarded,
            "Receiver closed"
        );
    }
}

impl<T: DeserializeOwned> Receiver<T> {
    /// Apply one received frame; `None` means the stream ended cleanly
    fn dispatch(&mut self, record: Value) -> Option<Result<T, ChannelError>> {
        let dispatch = classify(record);
        if dispatch.is_terminal() {
            self.close();
        }

        match dispatch {
            Dispatch::Result(payload) => match serde_json::from_value(payload) {
                Ok(value) => {
                    self.delivered += 1;
                    tracing::trace!(topic = %self.topic, seq = self.delivered, "Delivered result");
                    Some(Ok(value))
                }
                Err(e) => {
                    tracing::warn!(topic = %self.topic, error = %e, "Result payload does not decode");
                    self.close();
                    Some(Err(ChannelError::Decode(e.to_string())))
                }
            },
            Dispatch::Done => None,
            Dispatch::Error(message) => {
                tracing::debug!(topic = %self.topic, error = %message, "Producer reported failure");
                Some(Err(ChannelError::Producer(message)))
            }
            Dispatch::Unknown(tag) => {
                tracing::warn!(topic = %self.topic, tag = %tag, "Unknown frame type");
                Some(Err(ChannelError::UnknownMessageType(tag)))
            }
        }
    }
}

impl<T: DeserializeOwned> Stream for Receiver<T> {
    type Item = Result<T, ChannelError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match this.state {
            ReceiverState::Closed => return Poll::Ready(None),
            ReceiverState::Pending => {
                this.state = ReceiverState::Iterating;
                tracing::debug!(
                    topic = %this.topic,
                    queued = this.queued_len(),
                    "Consumer started pulling"
                );
            }
            ReceiverState::Iterating => {}
        }

        match this.queue.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(record)) => {
                this.depth.decrement();
                Poll::Ready(this.dispatch(record))
            }
            Poll::Ready(None) => {
                tracing::warn!(topic = %this.topic, "Transport dropped subscription before a terminal frame");
                this.close();
                Poll::Ready(Some(Err(ChannelError::Disconnected)))
            }
        }
    }
}

impl<T: DeserializeOwned> FusedStream for Receiver<T> {
    fn is_terminated(&self) -> bool {
        self.state == ReceiverState::Closed
    }
}

impl<T> std::fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("topic", &self.topic)
            .field("state", &self.state)
            .field("queued", &self.queued_len())
            .field("delivered", &self.delivered)
            .finish()
    }
}
