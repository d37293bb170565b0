//! Roomcast Redis Layer
//!
//! Redis-backed broker for realtime events and the session store read by
//! the subscription endpoints.

pub mod broker;
pub mod client;
pub mod session;

pub use broker::RedisBroker;
pub use client::{LazyPool, RedisError, RedisPool, RedisResult};
pub use session::RedisSessionStore;
