//! Byte-Stream Bridge
//!
//! Relays topic messages between two transports that live in different
//! execution contexts (processes, threads with separate buses) over any
//! `AsyncRead`/`AsyncWrite` pair: a Unix socket, a TCP stream, a pipe.
//!
//! ```text
//!   bus A ──subscribe──▶ forward() ──bytes──▶ ingest() ──publish──▶ bus B
//! ```
//!
//! A bridge is one-directional. Forwarding a topic from A to B and from B to
//! A at the same time would echo every message back.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::CodecConfig;
use crate::error::TransportError;
use crate::frame::{ends_stream, Frame};
use crate::topic::Topic;

use super::codec::{encode_envelope, Envelope, WireDecoder};
use super::traits::{SharedTransport, Subscription};

/// Read buffer size for [`ingest`]
const READ_CHUNK: usize = 8 * 1024;

/// Outbound half of a bridge
///
/// Holds the local subscriptions; dropping it stops forwarding once the
/// already-captured messages are written.
pub struct ForwardHandle {
    subscriptions: Vec<Subscription>,
    task: JoinHandle<Result<u64, TransportError>>,
}

impl ForwardHandle {
    /// Topics being forwarded
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.iter().map(Subscription::topic)
    }

    /// Stop forwarding, flush what was captured, and close the writer
    ///
    /// Returns the number of envelopes written.
    ///
    /// # Errors
    ///
    /// Returns the first encoding or I/O error the writer task hit.
    pub async fn finish(self) -> Result<u64, TransportError> {
        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
        self.task.await.map_err(|e| TransportError::Io(std::io::Error::other(e)))?
    }
}

/// Forward every message published on `topics` to `writer`
///
/// Subscriptions attach before this returns, so anything published on the
/// local transport afterwards is captured.
pub fn forward<W>(
    transport: &SharedTransport,
    topics: &[Topic],
    writer: W,
    config: &CodecConfig,
) -> ForwardHandle
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

    let subscriptions = topics
        .iter()
        .map(|topic| {
            let tx = tx.clone();
            let name = topic.to_string();
            transport.subscribe(
                topic.as_str(),
                Arc::new(move |message| {
                    if tx.send(Envelope::new(name.clone(), message)).is_err() {
                        tracing::trace!(topic = %name, "Bridge writer gone, message dropped");
                    }
                }),
            )
        })
        .collect();
    drop(tx);

    let max_frame_size = config.max_frame_size;
    let task = tokio::spawn(async move {
        let mut writer = writer;
        let mut written = 0u64;

        while let Some(envelope) = rx.recv().await {
            let bytes = encode_envelope(&envelope, max_frame_size).map_err(|e| {
                tracing::error!(topic = %envelope.topic, error = %e, "Cannot encode envelope");
                e
            })?;
            writer.write_all(&bytes).await?;
            writer.flush().await?;
            written += 1;
        }

        writer.shutdown().await?;
        tracing::debug!(envelopes = written, "Bridge forwarder finished");
        Ok(written)
    });

    ForwardHandle {
        subscriptions,
        task,
    }
}

/// Republish every envelope read from `reader` on `transport`
///
/// Runs until `reader` reaches end of stream. Returns the number of
/// envelopes republished.
///
/// If the byte stream breaks (I/O failure, corrupt or truncated frame), every
/// topic whose stream was still open on this bridge gets an `ERROR` frame
/// describing the failure, so its receivers end instead of waiting.
pub fn ingest<R>(
    transport: SharedTransport,
    reader: R,
    config: &CodecConfig,
) -> JoinHandle<Result<u64, TransportError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let decoder = WireDecoder::with_max_frame_size(config.max_frame_size);

    tokio::spawn(async move {
        let mut relay = Ingest {
            transport,
            decoder,
            open_topics: HashSet::new(),
            delivered: 0,
        };
        let result = relay.run(reader).await;
        if let Err(e) = &result {
            relay.fail_open_topics(e);
        }
        result
    })
}

/// Receiving half of a bridge
struct Ingest {
    transport: SharedTransport,
    decoder: WireDecoder,
    /// Topics that saw frames but no terminal frame yet
    open_topics: HashSet<String>,
    delivered: u64,
}

impl Ingest {
    async fn run<R>(&mut self, mut reader: R) -> Result<u64, TransportError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.decoder.push(&buf[..n]);
            while let Some(envelope) = self.decoder.decode()? {
                self.republish(envelope);
            }
        }

        if self.decoder.available() > 0 {
            return Err(TransportError::TruncatedFrame {
                remaining: self.decoder.available(),
            });
        }

        tracing::debug!(envelopes = self.delivered, "Bridge ingest reached end of stream");
        Ok(self.delivered)
    }

    fn republish(&mut self, envelope: Envelope) {
        if ends_stream(&envelope.message) {
            self.open_topics.remove(&envelope.topic);
        } else {
            self.open_topics.insert(envelope.topic.clone());
        }
        self.transport.publish(&envelope.topic, envelope.message);
        self.delivered += 1;
    }

    fn fail_open_topics(&mut self, error: &TransportError) {
        tracing::warn!(
            error = %error,
            open_topics = self.open_topics.len(),
            "Bridge ingest failed, ending open streams"
        );
        let message = format!("Bridge ingest failed: {error}");
        for topic in self.open_topics.drain() {
            self.transport
                .publish(&topic, Frame::error(message.clone()).into_wire());
        }
    }
}
