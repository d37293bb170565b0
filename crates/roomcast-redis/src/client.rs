//! Redis connection management.

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

use roomcast_core::BrokerError;

/// Redis error types.
#[derive(Error, Debug)]
pub enum RedisError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RedisError {
    /// Whether the server could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            RedisError::Connection(e) => {
                e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
            }
            RedisError::Serialization(_) => false,
        }
    }
}

impl From<RedisError> for BrokerError {
    fn from(e: RedisError) -> Self {
        if e.is_unreachable() {
            BrokerError::Connection(e.to_string())
        } else {
            BrokerError::Publish(e.to_string())
        }
    }
}

/// Result type for Redis operations.
pub type RedisResult<T> = Result<T, RedisError>;

/// Redis connection pool. ConnectionManager handles multiplexing internally.
/// It is Clone, so callers clone it to get a mutable handle for each operation.
pub type RedisPool = ConnectionManager;

/// Bounds how long a publish can stall while Redis is down.
const CONNECT_RETRIES: usize = 1;
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// A pool that connects on first use and is then reused.
///
/// Concurrent first callers share one connection attempt. A failed attempt
/// leaves the cell empty so the next call retries.
pub struct LazyPool {
    client: redis::Client,
    pool: OnceCell<RedisPool>,
}

impl LazyPool {
    /// Parse the URL without connecting.
    ///
    /// Example URL: `redis://127.0.0.1:6379`
    pub fn new(redis_url: &str) -> RedisResult<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
            pool: OnceCell::new(),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// Connected pool handle, connecting if needed.
    pub async fn get(&self) -> RedisResult<RedisPool> {
        let pool = self
            .pool
            .get_or_try_init(|| async {
                debug!(url = ?self.client.get_connection_info().addr, "Connecting to Redis");
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(CONNECT_RETRIES)
                    .set_connection_timeout(CONNECT_TIMEOUT);
                ConnectionManager::new_with_config(self.client.clone(), config).await
            })
            .await?;
        Ok(pool.clone())
    }
}
