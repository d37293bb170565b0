//! Async task store backed by SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use roomcast_core::{AsyncTask, RealtimeError, RealtimeResult, TaskStatus, TaskStore};

use crate::pool::{DbError, DbPool, DbResult};
use crate::queries::tasks::{self as queries, TaskRow};

fn parse_timestamp(raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}

fn task_from_row(row: TaskRow) -> DbResult<AsyncTask> {
    let status = row
        .status
        .parse::<TaskStatus>()
        .map_err(|e| DbError::Corrupt(e.to_string()))?;
    Ok(AsyncTask {
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
        name: row.name,
        status,
        reference_doctype: row.reference_doctype,
        reference_name: row.reference_name,
    })
}

/// Queue a new task, optionally tied to a document.
pub fn create_task(
    pool: &DbPool,
    reference_doctype: Option<&str>,
    reference_name: Option<&str>,
) -> DbResult<AsyncTask> {
    let name = Uuid::new_v4().to_string();
    queries::create_task(pool, &name, reference_doctype, reference_name)?;
    debug!(task = %name, ?reference_doctype, ?reference_name, "Queued async task");
    get_task(pool, &name)
}

/// Get a task by name.
pub fn get_task(pool: &DbPool, name: &str) -> DbResult<AsyncTask> {
    task_from_row(queries::get_task(pool, name)?)
}

/// Move a task to a new status.
pub fn set_status(pool: &DbPool, name: &str, status: TaskStatus) -> DbResult<AsyncTask> {
    queries::set_task_status(pool, name, status.as_str())?;
    debug!(task = %name, status = %status, "Async task status changed");
    get_task(pool, name)
}

impl From<DbError> for RealtimeError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => RealtimeError::TaskNotFound(what),
            other => RealtimeError::storage(other.to_string()),
        }
    }
}

#[async_trait]
impl TaskStore for DbPool {
    #[instrument(skip(self))]
    async fn pending_tasks_for_doc(&self, doctype: &str, docname: &str) -> RealtimeResult<Vec<String>> {
        let names = queries::pending_tasks_for_doc(self, doctype, docname)?;
        debug!(count = names.len(), "Pending tasks for document");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    #[test]
    fn test_create_and_get_task() {
        let pool = pool();
        let task = create_task(&pool, Some("Data Import"), Some("IMP-001")).unwrap();

        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.reference_doctype.as_deref(), Some("Data Import"));

        let fetched = get_task(&pool, &task.name).unwrap();
        assert_eq!(fetched, task);
    }

    #[test]
    fn test_unknown_task_is_not_found() {
        let pool = pool();
        assert!(matches!(get_task(&pool, "missing"), Err(DbError::NotFound(_))));
        assert!(matches!(
            set_status(&pool, "missing", TaskStatus::Running),
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_pending_tasks_filters_status_and_reference() {
        let pool = pool();
        let queued = create_task(&pool, Some("Data Import"), Some("IMP-001")).unwrap();
        let running = create_task(&pool, Some("Data Import"), Some("IMP-001")).unwrap();
        let finished = create_task(&pool, Some("Data Import"), Some("IMP-001")).unwrap();
        let failed = create_task(&pool, Some("Data Import"), Some("IMP-001")).unwrap();
        create_task(&pool, Some("Data Import"), Some("IMP-002")).unwrap();
        create_task(&pool, Some("Bulk Update"), Some("IMP-001")).unwrap();
        create_task(&pool, None, None).unwrap();

        set_status(&pool, &running.name, TaskStatus::Running).unwrap();
        set_status(&pool, &finished.name, TaskStatus::Finished).unwrap();
        set_status(&pool, &failed.name, TaskStatus::Failed).unwrap();

        let mut pending = pool.pending_tasks_for_doc("Data Import", "IMP-001").await.unwrap();
        pending.sort();
        let mut expected = vec![queued.name, running.name];
        expected.sort();
        assert_eq!(pending, expected);
    }

    #[tokio::test]
    async fn test_no_pending_tasks() {
        let pool = pool();
        let pending = pool.pending_tasks_for_doc("ToDo", "TD-1").await.unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn test_db_error_maps_to_realtime_error() {
        let err: RealtimeError = DbError::NotFound("Async Task: x".to_string()).into();
        assert!(matches!(err, RealtimeError::TaskNotFound(_)));
        let err: RealtimeError = DbError::Poisoned.into();
        assert!(matches!(err, RealtimeError::Storage(_)));
    }
}
