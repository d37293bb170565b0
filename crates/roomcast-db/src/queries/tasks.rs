//! Async task table queries.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::{params, OptionalExtension, Row};

/// Async task row from database.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub name: String,
    pub status: String,
    pub reference_doctype: Option<String>,
    pub reference_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            status: row.get(1)?,
            reference_doctype: row.get(2)?,
            reference_name: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

/// Insert a new queued task.
pub fn create_task(
    pool: &DbPool,
    name: &str,
    reference_doctype: Option<&str>,
    reference_name: Option<&str>,
) -> DbResult<()> {
    let now = chrono::Utc::now().to_rfc3339();
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO \"tabAsync Task\"
                (name, status, reference_doctype, reference_name, created_at, updated_at)
             VALUES (?1, 'Queued', ?2, ?3, ?4, ?4)",
            params![name, reference_doctype, reference_name, now],
        )?;
        Ok(())
    })
}

/// Get a task by name.
pub fn get_task(pool: &DbPool, name: &str) -> DbResult<TaskRow> {
    pool.with_conn(|conn| {
        conn.query_row(
            "SELECT name, status, reference_doctype, reference_name, created_at, updated_at
             FROM \"tabAsync Task\" WHERE name = ?1",
            params![name],
            TaskRow::from_row,
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("Async Task: {}", name)))
    })
}

/// Change the status of a task.
pub fn set_task_status(pool: &DbPool, name: &str, status: &str) -> DbResult<()> {
    let now = chrono::Utc::now().to_rfc3339();
    pool.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE \"tabAsync Task\" SET status = ?1, updated_at = ?2 WHERE name = ?3",
            params![status, now, name],
        )?;
        if updated == 0 {
            return Err(DbError::NotFound(format!("Async Task: {}", name)));
        }
        Ok(())
    })
}

/// Names of queued or running tasks referencing a document, oldest first.
pub fn pending_tasks_for_doc(pool: &DbPool, doctype: &str, docname: &str) -> DbResult<Vec<String>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT name FROM \"tabAsync Task\"
             WHERE status IN ('Queued', 'Running')
               AND reference_doctype = ?1 AND reference_name = ?2
             ORDER BY created_at, name",
        )?;
        let names = stmt
            .query_map(params![doctype, docname], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    })
}
