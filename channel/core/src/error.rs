//! Error Types
//!
//! Errors surfaced to consumers of a result stream ([`ChannelError`]) and
//! errors raised while moving frames across a byte stream ([`TransportError`]).
//!
//! # Taxonomy
//!
//! - **Producer error**: the upstream sequence failed. The text is carried
//!   through unchanged so the consumer sees exactly what the producer raised.
//! - **Protocol violation**: a received frame had an unrecognized shape, or a
//!   result payload did not match the consumer's expected type.
//! - **Disconnected**: the transport dropped the subscription before any
//!   terminal frame arrived.

use thiserror::Error;

// =============================================================================
// Channel Errors
// =============================================================================

/// Error raised out of a [`Receiver`](crate::Receiver) iteration
///
/// Every variant is terminal: once a consumer observes one, the stream ends.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The producer's sequence failed; carries the producer's own message
    #[error("{0}")]
    Producer(String),

    /// A frame arrived whose `type` tag is not one of the known frame kinds
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    /// A result payload could not be decoded into the consumer's value type
    #[error("Malformed result payload: {0}")]
    Decode(String),

    /// The transport released the subscription before a terminal frame
    #[error("Transport closed before a terminal frame arrived")]
    Disconnected,
}

impl ChannelError {
    /// Whether this error was synthesized by the receiving side because the
    /// frames on the wire broke the protocol, as opposed to being raised by
    /// the producer
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::UnknownMessageType(_) | Self::Decode(_))
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors from the wire codec and the byte-stream bridge
#[derive(Debug, Error)]
pub enum TransportError {
    /// JSON serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Encoded payload exceeds the configured maximum
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge {
        /// Size of the offending payload
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// CRC32 of the payload did not match the header
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum carried in the header
        expected: u32,
        /// Checksum computed over the received payload
        actual: u32,
    },

    /// The stream ended in the middle of a frame
    #[error("Stream ended with {remaining} bytes of an incomplete frame")]
    TruncatedFrame {
        /// Bytes left undecoded at end of stream
        remaining: usize,
    },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
