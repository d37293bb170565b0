//! Roomcast Core Library
//!
//! Room naming, routing and deferred publishing of realtime events for an
//! external delivery server.

pub mod broker;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod permission;
pub mod publish;
pub mod room;
pub mod session;
pub mod subscribe;
pub mod tasks;

pub use broker::{Broker, BrokerError, MemoryBroker};
pub use config::RealtimeConfig;
pub use context::{RealtimeLog, RequestContext};
pub use error::{RealtimeError, RealtimeResult};
pub use event::{Message, RealtimeEvent, EVENTS_CHANNEL};
pub use publish::{Dispatch, PublishRequest, Publisher};
pub use room::Room;
pub use session::{SessionData, SessionStore};
pub use subscribe::{SubscriptionGuard, UserInfo};
pub use tasks::{AsyncTask, TaskStatus, TaskStore};
