//! Session lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::error::{RealtimeError, RealtimeResult};

/// User of requests without a valid session.
pub const GUEST: &str = "Guest";

/// Superuser; passes every permission check.
pub const ADMINISTRATOR: &str = "Administrator";

/// Data kept for a logged-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: String,
}

impl SessionData {
    pub fn guest() -> Self {
        Self {
            user: GUEST.to_string(),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.user == GUEST
    }
}

/// Storage that can resume a session from its id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session(&self, sid: &str) -> RealtimeResult<Option<SessionData>>;
}

/// Resume the session for `sid`, falling back to a guest session.
pub async fn resume_session(store: &dyn SessionStore, sid: Option<&str>) -> RealtimeResult<SessionData> {
    let Some(sid) = sid.filter(|s| !s.is_empty() && *s != GUEST) else {
        return Ok(SessionData::guest());
    };

    match store.get_session(sid).await? {
        Some(session) => Ok(session),
        None => {
            debug!("Unknown session id, continuing as guest");
            Ok(SessionData::guest())
        }
    }
}

/// Session store backed by a map; for tests and single-process setups.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, sid: impl Into<String>, user: impl Into<String>) -> RealtimeResult<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| RealtimeError::Session(e.to_string()))?;
        sessions.insert(sid.into(), SessionData { user: user.into() });
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_session(&self, sid: &str) -> RealtimeResult<Option<SessionData>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| RealtimeError::Session(e.to_string()))?;
        Ok(sessions.get(sid).cloned())
    }
}
