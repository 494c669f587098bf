//! Result Sender
//!
//! Drains a producer's stream and publishes one frame per value, followed by
//! exactly one terminal frame.
//!
//! Publishing is fire-and-forget: the sender never waits for, or even knows
//! about, receivers. Anything published while no receiver is subscribed is
//! gone; receivers are expected to subscribe before production starts.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::frame::Frame;
use crate::topic::Topic;
use crate::transport::SharedTransport;

/// How a drained stream ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminal {
    /// The producer exhausted normally; a `DONE` frame was published
    Done,
    /// The producer (or payload conversion) failed; an `ERROR` frame carrying
    /// this message was published
    Error(String),
}

/// What a [`Sender`] published
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendSummary {
    /// Topic the frames went to
    pub topic: Topic,
    /// Number of `RESULT` frames published
    pub results_published: usize,
    /// The terminal frame that closed the stream
    pub terminal: Terminal,
}

impl SendSummary {
    /// Whether the stream ended with `DONE`
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.terminal == Terminal::Done
    }
}

/// Producer side of a result channel
///
/// A sender is bound to one topic and drains exactly one producer; `send`
/// consumes it so a second terminal frame can never follow the first.
pub struct Sender {
    topic: Topic,
    transport: SharedTransport,
}

impl Sender {
    /// Bind a sender to `topic` on `transport`
    pub fn new(transport: SharedTransport, topic: impl Into<Topic>) -> Self {
        Self {
            topic: topic.into(),
            transport,
        }
    }

    /// Topic this sender publishes on
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Drain `producer`, publishing every value and then one terminal frame
    ///
    /// A producer item of `Err(e)` publishes `ERROR { message: e.to_string() }`
    /// and stops drawing from the producer. A value that cannot be serialized
    /// is treated the same way.
    pub async fn send<S, T, E>(self, producer: S) -> SendSummary
    where
        S: Stream<Item = Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        let mut producer = std::pin::pin!(producer);
        let mut results_published = 0;

        while let Some(item) = producer.next().await {
            let frame = match item {
                Ok(value) => Frame::result(&value).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match frame {
                Ok(frame) => {
                    self.publish(frame);
                    results_published += 1;
                    tracing::trace!(topic = %self.topic, seq = results_published, "Published result frame");
                }
                Err(message) => {
                    tracing::debug!(
                        topic = %self.topic,
                        results = results_published,
                        error = %message,
                        "Producer failed, publishing error frame"
                    );
                    self.publish(Frame::error(message.clone()));
                    return self.summary(results_published, Terminal::Error(message));
                }
            }
        }

        tracing::debug!(topic = %self.topic, results = results_published, "Producer exhausted, publishing done frame");
        self.publish(Frame::Done);
        self.summary(results_published, Terminal::Done)
    }

    /// Drain `producer` on the runtime without awaiting it
    ///
    /// The returned handle can be awaited for the [`SendSummary`] or dropped.
    pub fn spawn<S, T, E>(self, producer: S) -> JoinHandle<SendSummary>
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
    {
        tokio::spawn(self.send(producer))
    }

    fn publish(&self, frame: Frame) {
        self.transport.publish(self.topic.as_str(), frame.into_wire());
    }

    fn summary(self, results_published: usize, terminal: Terminal) -> SendSummary {
        SendSummary {
            topic: self.topic,
            results_published,
            terminal,
        }
    }
}
