//! Per-request state: site scope, task, session user and the deferred log.

use tracing::debug;

use crate::event::RealtimeEvent;
use crate::publish::Publisher;
use crate::session::GUEST;

/// Events waiting for the enclosing transaction to commit.
///
/// Holds no duplicates: pushing an event equal to one already queued is a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealtimeLog {
    entries: Vec<RealtimeEvent>,
}

impl RealtimeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event. Returns `false` if an identical one was already queued.
    pub fn push(&mut self, event: RealtimeEvent) -> bool {
        if self.entries.contains(&event) {
            return false;
        }
        self.entries.push(event);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take every queued event, leaving the log empty.
    pub fn take(&mut self) -> Vec<RealtimeEvent> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Everything routing needs to know about the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub site: String,
    pub task_id: Option<String>,
    pub user: String,
    pub realtime_log: RealtimeLog,
}

impl RequestContext {
    /// Context for an anonymous web request.
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            task_id: None,
            user: GUEST.to_string(),
            realtime_log: RealtimeLog::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Mark this context as running inside a background task.
    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into()).filter(|t: &String| !t.is_empty());
        self
    }

    /// Publish everything deferred during the transaction, in order.
    ///
    /// Returns how many events the broker accepted. The log is emptied
    /// either way.
    pub async fn commit(&mut self, publisher: &Publisher) -> usize {
        let pending = self.realtime_log.take();
        let mut sent = 0;
        for event in &pending {
            if publisher.emit(event).await {
                sent += 1;
            }
        }
        if !pending.is_empty() {
            debug!(
                site = %self.site,
                queued = pending.len(),
                sent,
                "Flushed deferred realtime events"
            );
        }
        sent
    }

    /// Drop deferred events; the changes they describe never happened.
    pub fn rollback(&mut self) {
        if !self.realtime_log.is_empty() {
            debug!(
                site = %self.site,
                discarded = self.realtime_log.len(),
                "Discarding deferred realtime events on rollback"
            );
        }
        self.realtime_log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::MemoryBroker;
    use crate::event::Message;
    use crate::room::Room;
    use std::sync::Arc;

    fn event(name: &str) -> RealtimeEvent {
        RealtimeEvent::new(name, Message::new(), Room::site("s"))
    }

    #[test]
    fn test_log_skips_duplicates() {
        let mut log = RealtimeLog::new();
        assert!(log.push(event("a")));
        assert!(!log.push(event("a")));
        assert!(log.push(event("b")));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_log_take_empties() {
        let mut log = RealtimeLog::new();
        log.push(event("a"));
        let taken = log.take();
        assert_eq!(taken.len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_context_defaults_to_guest() {
        let ctx = RequestContext::new("site1");
        assert_eq!(ctx.user, GUEST);
        assert!(ctx.task_id.is_none());
    }

    #[test]
    fn test_empty_task_id_is_no_task() {
        let ctx = RequestContext::new("site1").with_task("");
        assert!(ctx.task_id.is_none());
    }

    #[tokio::test]
    async fn test_commit_counts_accepted_events() {
        let broker = Arc::new(MemoryBroker::new());
        let publisher = Publisher::new(broker.clone());
        let mut ctx = RequestContext::new("site1");
        ctx.realtime_log.push(event("a"));
        ctx.realtime_log.push(event("b"));

        assert_eq!(ctx.commit(&publisher).await, 2);
        assert_eq!(broker.published().len(), 2);
        assert!(ctx.realtime_log.is_empty());
    }

    #[tokio::test]
    async fn test_commit_with_offline_broker_sends_nothing() {
        let broker = Arc::new(MemoryBroker::new());
        broker.set_offline(true);
        let publisher = Publisher::new(broker.clone());
        let mut ctx = RequestContext::new("site1");
        ctx.realtime_log.push(event("a"));

        assert_eq!(ctx.commit(&publisher).await, 0);
        assert!(ctx.realtime_log.is_empty());
    }

    #[test]
    fn test_rollback_clears_log() {
        let mut ctx = RequestContext::new("site1");
        ctx.realtime_log.push(event("a"));
        ctx.rollback();
        assert!(ctx.realtime_log.is_empty());
    }
}
