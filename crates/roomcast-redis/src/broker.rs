//! Redis pub/sub broker for realtime events.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use roomcast_core::{Broker, BrokerError};

use crate::client::{LazyPool, RedisError, RedisResult};

/// Publishes payloads with `PUBLISH`; the delivery server subscribes.
pub struct RedisBroker {
    pool: LazyPool,
}

impl RedisBroker {
    /// Create a broker for `redis_url`. No connection is made until the first publish.
    pub fn new(redis_url: &str) -> RedisResult<Self> {
        Ok(Self {
            pool: LazyPool::new(redis_url)?,
        })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        let mut conn = self.pool.get().await?;
        let receivers: i64 = conn
            .publish(channel, payload)
            .await
            .map_err(RedisError::from)?;
        debug!(channel, receivers, "Published to Redis channel");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "RedisBroker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcast_core::{PublishRequest, Publisher, RequestContext};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unreachable_broker_is_a_connection_error() {
        // Port 1 is never a Redis server.
        let broker = RedisBroker::new("redis://127.0.0.1:1").unwrap();

        let err = broker.publish("events", "{}").await.unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_publisher_swallows_unreachable_broker() {
        let broker = Arc::new(RedisBroker::new("redis://127.0.0.1:1").unwrap());
        let publisher = Publisher::new(broker);
        let mut ctx = RequestContext::new("site1");

        let dispatch = publisher
            .publish_realtime(&mut ctx, PublishRequest::new().event("list_update"))
            .await;

        assert_eq!(dispatch, roomcast_core::Dispatch::Dropped);
    }
}
