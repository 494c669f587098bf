//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use channel_core::{ChannelError, InProcessBus, Receiver};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber; `RUST_LOG=channel_core=trace` to see frames
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A fresh bus
pub fn bus() -> Arc<InProcessBus> {
    init_tracing();
    Arc::new(InProcessBus::new())
}

/// Everything a consumer observed: the values, then how it ended
#[derive(Debug, PartialEq)]
pub struct Observed<T> {
    pub values: Vec<T>,
    pub error: Option<ChannelError>,
}

/// Pull a receiver to the end, recording values and the terminal error
pub async fn drain<T: DeserializeOwned>(mut receiver: Receiver<T>) -> Observed<T> {
    let mut values = Vec::new();
    let mut error = None;
    while let Some(item) = receiver.next().await {
        match item {
            Ok(value) => values.push(value),
            Err(e) => {
                assert!(error.is_none(), "receiver yielded a second error");
                error = Some(e);
            }
        }
    }
    Observed { values, error }
}
