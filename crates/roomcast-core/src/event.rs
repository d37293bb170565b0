//! The record pushed onto the broker channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::room::Room;

/// Channel the delivery server listens on.
pub const EVENTS_CHANNEL: &str = "events";

/// Default event name outside a background task.
pub const GLOBAL_EVENT: &str = "global";

/// Default event name inside a background task.
pub const TASK_PROGRESS_EVENT: &str = "task_progress";

/// Event name for user-facing message popups.
pub const MSGPRINT_EVENT: &str = "msgprint";

/// Event name used by progress bars.
pub const PROGRESS_EVENT: &str = "progress";

/// Key-value payload carried by an event.
pub type Message = Map<String, Value>;

/// One realtime event, as serialized onto [`EVENTS_CHANNEL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: String,
    pub message: Message,
    pub room: Room,
}

impl RealtimeEvent {
    pub fn new(event: impl Into<String>, message: Message, room: Room) -> Self {
        Self {
            event: event.into(),
            message,
            room,
        }
    }

    /// JSON payload for the broker.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let mut message = Message::new();
        message.insert("percent".to_string(), json!(40));
        let event = RealtimeEvent::new("progress", message, Room::user("s", "u"));

        let value: Value = serde_json::from_str(&event.to_payload().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"event": "progress", "message": {"percent": 40}, "room": "s:user:u"})
        );
    }
}
