//! Transport Layer
//!
//! The broadcast primitive result channels ride on, plus the pieces needed
//! to stretch it across execution contexts:
//! - [`traits`]: the `BroadcastTransport` seam senders and receivers use
//! - [`in_process`]: topic bus for a single process
//! - [`codec`]: length-prefixed, checksummed envelope framing
//! - [`bridge`]: relays a topic from one transport to another over a byte stream
//!
//! # Delivery Contract
//!
//! - Every message reaches every subscriber attached at publish time
//! - A single publisher's messages reach each subscriber in send order
//! - Nothing is replayed to subscribers that attach later

pub mod bridge;
pub mod codec;
pub mod in_process;
pub mod traits;

// Re-exports for convenience
pub use bridge::{forward, ingest, ForwardHandle};
pub use codec::{encode_envelope, Envelope, WireDecoder};
pub use in_process::InProcessBus;
pub use traits::{BroadcastTransport, MessageHandler, SharedTransport, Subscription};
