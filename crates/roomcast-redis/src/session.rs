//! Sessions stored in the Redis cache.
//!
//! Session data lives in the `session` hash, one JSON field per session id.

use async_trait::async_trait;
use redis::AsyncCommands;

use roomcast_core::{RealtimeError, RealtimeResult, SessionData, SessionStore};

use crate::client::{LazyPool, RedisError, RedisResult};

/// Hash holding every session.
pub const SESSION_HASH: &str = "session";

pub struct RedisSessionStore {
    pool: LazyPool,
}

impl RedisSessionStore {
    pub fn new(redis_url: &str) -> RedisResult<Self> {
        Ok(Self {
            pool: LazyPool::new(redis_url)?,
        })
    }

    async fn fetch(&self, sid: &str) -> RedisResult<Option<SessionData>> {
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = conn.hget(SESSION_HASH, sid).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get_session(&self, sid: &str) -> RealtimeResult<Option<SessionData>> {
        self.fetch(sid)
            .await
            .map_err(|e: RedisError| RealtimeError::Session(e.to_string()))
    }
}
