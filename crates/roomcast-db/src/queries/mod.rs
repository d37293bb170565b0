//! Database query modules.

pub mod tasks;
