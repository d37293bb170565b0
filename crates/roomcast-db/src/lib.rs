//! Roomcast Database Layer
//!
//! SQLite storage for the async task table that backs pending-task lookups.

pub mod migrations;
pub mod pool;
pub mod queries;
pub mod tasks;

use std::path::Path;
use tracing::info;

pub use pool::{DbError, DbPool, DbResult};

/// Open the database at `path` and bring its schema up to date.
pub fn init_pool(path: &Path) -> DbResult<DbPool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let pool = DbPool::open(path)?;
    migrations::run_migrations(&pool)?;
    info!(path = %path.display(), "Task database ready");
    Ok(pool)
}
