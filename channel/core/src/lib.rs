//! Channel Core - Ordered Result Streaming over a Broadcast Bus
//!
//! A result channel carries one producer's stream of values (or its failure)
//! to one consumer, over a topic on a fan-out publish/subscribe transport.
//! The consumer may start listening before, during, or after production, and
//! still sees every value exactly once, in order, followed by a clean end or
//! the producer's error.
//!
//! # Architecture
//!
//! ```text
//!   producer stream                                         consumer
//!        │                                                      ▲
//!        ▼                                                      │
//!  ┌───────────┐  RESULT* (DONE | ERROR)  ┌───────────┐   ┌─────┴──────┐
//!  │  Sender   │ ───────── publish ─────▶ │ Transport │──▶│  Receiver  │
//!  └───────────┘        topic "t"         └───────────┘   │  [queue]   │
//!                                                         └────────────┘
//! ```
//!
//! The sender and receiver never reference each other; the topic name is the
//! only thing they share. The receiver subscribes on construction and queues
//! frames until the consumer pulls, which is what bridges the timing gap.
//!
//! # Key Types
//!
//! - [`Sender`]: drains a producer stream into frames
//! - [`Receiver`]: a `Stream<Item = Result<T, ChannelError>>` over a topic
//! - [`Frame`] / [`classify`]: the wire protocol and its single interpreter
//! - [`BroadcastTransport`]: the pub/sub seam; [`InProcessBus`] implements it
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use channel_core::{InProcessBus, Receiver, Sender, SharedTransport, Topic};
//! use futures::{stream, TryStreamExt};
//!
//! let bus: SharedTransport = Arc::new(InProcessBus::new());
//! let topic = Topic::unique("thumbnails");
//!
//! let receiver = Receiver::<String>::new(Arc::clone(&bus), &topic);
//! Sender::new(bus, &topic).spawn(stream::iter(vec![
//!     Ok::<_, std::io::Error>("foo".to_string()),
//!     Ok("bar".to_string()),
//! ]));
//!
//! let values: Vec<String> = receiver.try_collect().await?;
//! ```
//!
//! # Module Overview
//!
//! - [`frame`]: frame types and dispatch
//! - [`sender`]: producer side
//! - [`receiver`]: consumer side and its state machine
//! - [`transport`]: broadcast seam, in-process bus, wire codec, byte-stream bridge
//! - [`config`]: TOML / environment configuration
//! - [`error`]: error types
//! - [`topic`]: topic names

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod frame;
pub mod receiver;
pub mod sender;
pub mod topic;
pub mod transport;

// Re-exports for convenience
pub use config::{
    default_config_path, load_config, load_config_from_path, ChannelConfig, ChannelToml,
    CodecConfig, ConfigError, ConfigOverrides, ConfigSource, ReceiverConfig,
};
pub use error::{ChannelError, TransportError};
pub use frame::{classify, ends_stream, Dispatch, Frame};
pub use receiver::{Receiver, ReceiverState};
pub use sender::{SendSummary, Sender, Terminal};
pub use topic::Topic;
pub use transport::{BroadcastTransport, InProcessBus, SharedTransport, Subscription};
