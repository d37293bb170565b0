//! Outbound broker abstraction.
//!
//! The delivery server subscribes to a pub/sub channel; this crate only ever
//! publishes to it. The Redis implementation lives in `roomcast-redis`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Errors a broker can report on publish.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Broker unreachable: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),
}

impl BrokerError {
    pub fn is_connection(&self) -> bool {
        matches!(self, BrokerError::Connection(_))
    }
}

/// Anything that can push a payload onto a named channel.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError>;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;
}

/// In-process broker that records what was published.
///
/// Useful for tests and for running without a Redis server.
#[derive(Debug, Default)]
pub struct MemoryBroker {
    published: Mutex<Vec<(String, String)>>,
    offline: AtomicBool,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following publish fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// `(channel, payload)` pairs in publish order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Payloads published on one channel, parsed as JSON.
    pub fn payloads(&self, channel: &str) -> Vec<serde_json::Value> {
        self.published()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .filter_map(|(_, payload)| serde_json::from_str(&payload).ok())
            .collect()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BrokerError::Connection("memory broker is offline".to_string()));
        }
        let mut published = self
            .published
            .lock()
            .map_err(|e| BrokerError::Publish(e.to_string()))?;
        published.push((channel.to_string(), payload.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MemoryBroker"
    }
}
