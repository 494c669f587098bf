//! Wire Codec
//!
//! Byte framing for carrying topic messages between execution contexts.
//! Each message travels as an [`Envelope`] encoded as length-prefixed JSON
//! with a CRC32 checksum.
//!
//! # Frame Format
//!
//! ```text
//! +----------------+----------------+------------------------------------------+
//! | Length (4)     | Checksum (4)   | JSON Payload (variable)                  |
//! | big-endian u32 | CRC32          | Envelope { topic, message }              |
//! +----------------+----------------+------------------------------------------+
//! ```
//!
//! The length covers the JSON payload only. The decoder validates it against
//! the configured maximum before waiting for the payload bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CodecConfig;
use crate::error::TransportError;

/// Frame header size: 4 bytes length + 4 bytes checksum
pub const HEADER_SIZE: usize = 8;

/// Minimum buffer capacity for decoder
const MIN_BUFFER_CAPACITY: usize = 4096;

/// A message together with the topic it was published on
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Topic the message belongs to
    pub topic: String,
    /// The raw record as published
    pub message: Value,
}

impl Envelope {
    /// Create an envelope
    pub fn new(topic: impl Into<String>, message: Value) -> Self {
        Self {
            topic: topic.into(),
            message,
        }
    }
}

#[inline]
fn compute_checksum(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}

/// Lay out a header: payload length, then payload checksum
fn write_header(len: u32, checksum: u32) -> [u8; HEADER_SIZE] {
    let [l0, l1, l2, l3] = len.to_be_bytes();
    let [c0, c1, c2, c3] = checksum.to_be_bytes();
    [l0, l1, l2, l3, c0, c1, c2, c3]
}

/// Split a header into `(payload length, payload checksum)`
fn read_header(header: &[u8; HEADER_SIZE]) -> (usize, u32) {
    let [l0, l1, l2, l3, c0, c1, c2, c3] = *header;
    (
        u32::from_be_bytes([l0, l1, l2, l3]) as usize,
        u32::from_be_bytes([c0, c1, c2, c3]),
    )
}

/// Encode an envelope to a length-prefixed frame with CRC32 checksum
///
/// # Errors
///
/// Returns `TransportError::Serialization` if JSON encoding fails and
/// `TransportError::FrameTooLarge` if the payload exceeds `max_frame_size`.
pub fn encode_envelope(
    envelope: &Envelope,
    max_frame_size: usize,
) -> Result<Vec<u8>, TransportError> {
    let json = serde_json::to_vec(envelope)
        .map_err(|e| TransportError::Serialization(e.to_string()))?;

    let too_large = |max| TransportError::FrameTooLarge {
        size: json.len(),
        max,
    };
    if json.len() > max_frame_size {
        return Err(too_large(max_frame_size));
    }
    let len = u32::try_from(json.len()).map_err(|_| too_large(u32::MAX as usize))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + json.len());
    frame.extend_from_slice(&write_header(len, compute_checksum(&json)));
    frame.extend_from_slice(&json);
    Ok(frame)
}

/// Streaming decoder for envelope frames
///
/// Buffers incoming bytes and yields complete envelopes in arrival order.
/// A decode error leaves the offending frame in place; the byte stream is not
/// recoverable past it.
#[derive(Debug)]
pub struct WireDecoder {
    buffer: Vec<u8>,
    consumed: usize,
    max_frame_size: usize,
}

impl Default for WireDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl WireDecoder {
    /// Create a decoder with the default frame size limit
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_frame_size(CodecConfig::default().max_frame_size)
    }

    /// Create a decoder with an explicit frame size limit
    #[must_use]
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(MIN_BUFFER_CAPACITY),
            consumed: 0,
            max_frame_size,
        }
    }

    /// Append bytes to the buffer
    pub fn push(&mut self, data: &[u8]) {
        // Reclaim decoded bytes once they outweigh the undecoded tail
        if self.consumed >= MIN_BUFFER_CAPACITY && self.consumed * 2 > self.buffer.len() {
            self.buffer.drain(..self.consumed);
            self.consumed = 0;
        }
        self.buffer.extend_from_slice(data);
    }

    /// Bytes buffered but not yet decoded
    #[must_use]
    pub fn available(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> &[u8] {
        &self.buffer[self.consumed..]
    }

    /// Try to decode the next envelope
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    ///
    /// # Errors
    ///
    /// Fails on an oversize length header, a checksum mismatch, or a payload
    /// that is not a valid envelope.
    pub fn decode(&mut self) -> Result<Option<Envelope>, TransportError> {
        let Some(header) = self.pending().first_chunk::<HEADER_SIZE>() else {
            return Ok(None);
        };
        let (len, expected) = read_header(header);
        if len > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        let frame_len = HEADER_SIZE + len;
        let Some(payload) = self.pending().get(HEADER_SIZE..frame_len) else {
            return Ok(None);
        };
        let actual = compute_checksum(payload);
        if actual != expected {
            return Err(TransportError::ChecksumMismatch { expected, actual });
        }
        let envelope = serde_json::from_slice(payload)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        self.consumed += frame_len;
        Ok(Some(envelope))
    }
}
