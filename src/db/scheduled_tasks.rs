//! Scheduled task CRUD operations.

use super::{Database, map_insert_error};
use crate::error::ServiceError;
use crate::types::{ScheduledTask, ScheduledTaskUpdate};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

const SCHEDULED_TASK_COLUMNS: &str = "id, title, description, expression, parent";

pub fn parse_scheduled_task_row(row: &Row) -> rusqlite::Result<ScheduledTask> {
    Ok(ScheduledTask {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        expression: row.get("expression")?,
        parent: row.get("parent")?,
    })
}

fn get_scheduled_task_internal(conn: &Connection, id: &str) -> Result<Option<ScheduledTask>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM scheduled_tasks WHERE id = ?1",
        SCHEDULED_TASK_COLUMNS
    ))?;

    match stmt.query_row(params![id], parse_scheduled_task_row) {
        Ok(scheduled) => Ok(Some(scheduled)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Insert a scheduled task definition.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    pub fn insert_scheduled_task(&self, scheduled: &ScheduledTask) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO scheduled_tasks (id, title, description, expression, parent)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    scheduled.id,
                    scheduled.title,
                    scheduled.description,
                    scheduled.expression,
                    scheduled.parent,
                ],
            )
            .map_err(|e| map_insert_error(e, "scheduled task", &scheduled.id))?;
            Ok(())
        })
    }

    /// Get a scheduled task by ID.
    pub fn get_scheduled_task(&self, id: &str) -> Result<Option<ScheduledTask>> {
        self.with_conn(|conn| get_scheduled_task_internal(conn, id))
    }

    /// List one page of scheduled tasks. `limit` is clamped to the configured cap.
    pub fn list_scheduled_tasks(&self, offset: usize, limit: usize) -> Result<Vec<ScheduledTask>> {
        let limit = self.clamp_limit(limit);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM scheduled_tasks ORDER BY id LIMIT ?1 OFFSET ?2",
                SCHEDULED_TASK_COLUMNS
            ))?;
            let scheduled = stmt
                .query_map(params![limit as i64, offset], parse_scheduled_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(scheduled)
        })
    }

    /// Every stored scheduled task, without paging. Used at startup recovery.
    pub fn all_scheduled_tasks(&self) -> Result<Vec<ScheduledTask>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM scheduled_tasks ORDER BY id",
                SCHEDULED_TASK_COLUMNS
            ))?;
            let scheduled = stmt
                .query_map([], parse_scheduled_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(scheduled)
        })
    }

    /// Update the given fields and return the stored row.
    ///
    /// Fails with `ScheduledTaskNotFound` if the row does not exist.
    pub fn update_scheduled_task(&self, id: &str, update: &ScheduledTaskUpdate) -> Result<ScheduledTask> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut scheduled = get_scheduled_task_internal(&tx, id)?
                .ok_or_else(|| ServiceError::scheduled_task_not_found(id))?;

            if let Some(ref title) = update.title {
                scheduled.title = title.clone();
            }
            if let Some(ref description) = update.description {
                scheduled.description = description.clone();
            }
            if let Some(ref parent) = update.parent {
                scheduled.parent = parent.clone();
            }
            if let Some(ref expression) = update.expression {
                scheduled.expression = expression.clone();
            }

            tx.execute(
                "UPDATE scheduled_tasks SET title = ?1, description = ?2, expression = ?3, parent = ?4
                 WHERE id = ?5",
                params![
                    scheduled.title,
                    scheduled.description,
                    scheduled.expression,
                    scheduled.parent,
                    id,
                ],
            )?;

            tx.commit()?;
            Ok(scheduled)
        })
    }

    /// Delete a scheduled task. Returns whether a row was removed.
    pub fn delete_scheduled_task(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM scheduled_tasks WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
    }
}
