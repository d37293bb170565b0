//! Application state.

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use roomcast_core::session::resume_session;
use roomcast_core::{
    Publisher, RealtimeResult, RequestContext, SessionData, SessionStore, SubscriptionGuard,
    TaskStore,
};

/// Header carrying the session id for clients that cannot send cookies.
pub const SESSION_HEADER: &str = "x-session-id";

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "sid";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub site: String,
    pub publisher: Publisher,
    pub sessions: Arc<dyn SessionStore>,
    pub subscriptions: SubscriptionGuard,
    pub tasks: Arc<dyn TaskStore>,
}

impl AppState {
    pub fn new(
        site: impl Into<String>,
        publisher: Publisher,
        sessions: Arc<dyn SessionStore>,
        subscriptions: SubscriptionGuard,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            site: site.into(),
            publisher,
            sessions,
            subscriptions,
            tasks,
        }
    }

    /// Resume the session of the calling client; guest if none.
    pub async fn session(&self, headers: &HeaderMap) -> RealtimeResult<SessionData> {
        let sid = session_id(headers);
        resume_session(self.sessions.as_ref(), sid.as_deref()).await
    }

    /// Fresh request context for the calling session.
    pub fn context(&self, session: &SessionData) -> RequestContext {
        RequestContext::new(self.site.clone()).with_user(session.user.clone())
    }
}

/// Session id from the `x-session-id` header, else the `sid` cookie.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    if let Some(sid) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(sid.trim().to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string())
}
