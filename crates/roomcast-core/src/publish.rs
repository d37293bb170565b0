//! Publish-with-routing.
//!
//! Callers describe who should hear about an event with overlapping hints
//! (explicit room, task, user, document). Exactly one room is picked:
//!
//! 1. explicit room
//! 2. active task, which also forces immediate delivery
//! 3. user
//! 4. document (doctype and docname both present)
//! 5. whole site

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::broker::Broker;
use crate::context::RequestContext;
use crate::event::{
    Message, RealtimeEvent, EVENTS_CHANNEL, GLOBAL_EVENT, MSGPRINT_EVENT, PROGRESS_EVENT,
    TASK_PROGRESS_EVENT,
};
use crate::room::Room;

/// What the caller wants published. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PublishRequest {
    pub event: Option<String>,
    pub message: Option<Message>,
    pub room: Option<String>,
    pub user: Option<String>,
    pub doctype: Option<String>,
    pub docname: Option<String>,
    pub task_id: Option<String>,
    #[serde(default)]
    pub after_commit: bool,
}

/// A request after routing: the final event and whether to defer it.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub event: RealtimeEvent,
    pub after_commit: bool,
}

/// What happened to a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the broker.
    Sent,
    /// Broker rejected or was unreachable; the event is gone.
    Dropped,
    /// Queued until the request commits.
    Deferred,
    /// An identical event was already queued.
    AlreadyQueued,
}

impl Dispatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dispatch::Sent => "sent",
            Dispatch::Dropped => "dropped",
            Dispatch::Deferred => "deferred",
            Dispatch::AlreadyQueued => "already_queued",
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl PublishRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn doc(mut self, doctype: impl Into<String>, docname: impl Into<String>) -> Self {
        self.doctype = Some(doctype.into());
        self.docname = Some(docname.into());
        self
    }

    pub fn task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn after_commit(mut self, after_commit: bool) -> Self {
        self.after_commit = after_commit;
        self
    }

    /// Resolve the event name, message and room against a request context.
    pub fn route(self, ctx: &RequestContext) -> Routed {
        let mut message = self.message.unwrap_or_default();
        let mut after_commit = self.after_commit;

        let event = self.event.unwrap_or_else(|| {
            if ctx.task_id.is_some() {
                TASK_PROGRESS_EVENT.to_string()
            } else {
                GLOBAL_EVENT.to_string()
            }
        });

        let mut user = present(self.user);
        if event == MSGPRINT_EVENT && user.is_none() {
            user = Some(ctx.user.clone());
        }

        let room = if let Some(room) = present(self.room) {
            Room::custom(&ctx.site, &room)
        } else if let Some(task_id) = present(self.task_id).or_else(|| ctx.task_id.clone()) {
            message
                .entry("task_id")
                .or_insert_with(|| Value::String(task_id.clone()));
            after_commit = false;
            Room::task_progress(&ctx.site, &task_id)
        } else if let Some(user) = user {
            Room::user(&ctx.site, &user)
        } else if let (Some(doctype), Some(docname)) = (present(self.doctype), present(self.docname)) {
            Room::doc(&ctx.site, &doctype, &docname)
        } else {
            Room::site(&ctx.site)
        };

        Routed {
            event: RealtimeEvent::new(event, message, room),
            after_commit,
        }
    }
}

/// Publishes realtime events through an injected broker.
#[derive(Clone)]
pub struct Publisher {
    broker: Arc<dyn Broker>,
}

impl Publisher {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// Route a request and either publish it now or queue it on the context.
    ///
    /// Never fails: realtime delivery is best-effort.
    pub async fn publish_realtime(&self, ctx: &mut RequestContext, request: PublishRequest) -> Dispatch {
        let routed = request.route(ctx);

        if routed.after_commit {
            let room = routed.event.room.clone();
            if ctx.realtime_log.push(routed.event) {
                debug!(room = %room, queued = ctx.realtime_log.len(), "Deferred realtime event until commit");
                Dispatch::Deferred
            } else {
                debug!(room = %room, "Identical realtime event already queued");
                Dispatch::AlreadyQueued
            }
        } else if self.emit(&routed.event).await {
            Dispatch::Sent
        } else {
            Dispatch::Dropped
        }
    }

    /// Publish a progress bar update to the session user.
    pub async fn publish_progress(
        &self,
        ctx: &mut RequestContext,
        percent: f64,
        title: Option<&str>,
        doctype: Option<&str>,
        docname: Option<&str>,
        description: Option<&str>,
    ) -> Dispatch {
        let mut message = Message::new();
        message.insert("percent".to_string(), json!(percent));
        message.insert("title".to_string(), json!(title));
        message.insert("description".to_string(), json!(description));

        let request = PublishRequest {
            event: Some(PROGRESS_EVENT.to_string()),
            message: Some(message),
            user: Some(ctx.user.clone()),
            doctype: doctype.map(str::to_string),
            docname: docname.map(str::to_string),
            ..PublishRequest::default()
        };
        self.publish_realtime(ctx, request).await
    }

    /// Push one event onto the broker channel. Returns whether it was accepted.
    pub async fn emit(&self, event: &RealtimeEvent) -> bool {
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, event = %event.event, "Failed to serialize realtime event");
                return false;
            }
        };

        match self.broker.publish(EVENTS_CHANNEL, &payload).await {
            Ok(()) => {
                debug!(
                    broker = self.broker.name(),
                    event = %event.event,
                    room = %event.room,
                    "Realtime event published"
                );
                true
            }
            Err(e) if e.is_connection() => {
                debug!(
                    broker = self.broker.name(),
                    error = %e,
                    "Realtime broker unreachable, event dropped"
                );
                false
            }
            Err(e) => {
                warn!(broker = self.broker.name(), error = %e, "Realtime publish failed");
                false
            }
        }
    }
}
