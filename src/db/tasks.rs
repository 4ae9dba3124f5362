//! Task CRUD operations.

use super::{Database, map_insert_error};
use crate::error::ServiceError;
use crate::types::{Task, TaskState, TaskUpdate};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use std::collections::HashSet;

const TASK_COLUMNS: &str = "id, title, description, state, created, modified, parent";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let state: String = row.get("state")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        state: TaskState::parse(&state),
        created: row.get("created")?,
        modified: row.get("modified")?,
        parent: row.get("parent")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Direct children of a task, oldest first.
pub(crate) fn get_children_internal(conn: &Connection, parent_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tasks WHERE parent = ?1 ORDER BY created, id",
        TASK_COLUMNS
    ))?;

    let tasks = stmt
        .query_map(params![parent_id], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(tasks)
}

/// Reject a parent assignment that would make `task_id` its own ancestor.
///
/// Walks upward from the proposed parent. Data that already contains a cycle
/// stops the walk once an ancestor repeats.
fn check_parent_cycle(conn: &Connection, task_id: &str, parent: &str) -> Result<()> {
    let mut seen = HashSet::new();
    let mut current = parent.to_string();

    while !current.is_empty() {
        if current == task_id {
            return Err(ServiceError::parent_cycle(task_id, parent).into());
        }
        if !seen.insert(current.clone()) {
            break;
        }
        current = match get_task_internal(conn, &current)? {
            Some(task) => task.parent,
            None => break,
        };
    }

    Ok(())
}

impl Database {
    /// Insert a task exactly as given.
    ///
    /// Fails with `AlreadyExists` if a task with the same id is stored.
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, title, description, state, created, modified, parent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id,
                    task.title,
                    task.description,
                    task.state.as_str(),
                    task.created,
                    task.modified,
                    task.parent,
                ],
            )
            .map_err(|e| map_insert_error(e, "task", &task.id))?;
            Ok(())
        })
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List tasks oldest first. `limit` is clamped to the configured cap.
    pub fn list_tasks(&self, offset: usize, limit: usize, exclude_completed: bool) -> Result<Vec<Task>> {
        let limit = self.clamp_limit(limit);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        self.with_conn(|conn| {
            let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
            if exclude_completed {
                sql.push_str(" WHERE state != 'COMPLETED'");
            }
            sql.push_str(" ORDER BY created, id LIMIT ?1 OFFSET ?2");

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params![limit as i64, offset], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }

    /// Get direct children of a task.
    pub fn get_children(&self, parent_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| get_children_internal(conn, parent_id))
    }

    /// Total number of stored tasks.
    pub fn count_tasks(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    /// Update the given fields of a task and stamp `modified`.
    ///
    /// A new non-empty parent must exist and must not be a descendant of the
    /// task. Fails with `TaskNotFound` if the task does not exist.
    pub fn update_task(&self, task_id: &str, update: &TaskUpdate, modified: i64) -> Result<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| ServiceError::task_not_found(task_id))?;

            if let Some(ref parent) = update.parent
                && !parent.is_empty()
            {
                if get_task_internal(&tx, parent)?.is_none() {
                    return Err(ServiceError::task_not_found(parent)
                        .with_field("parent")
                        .into());
                }
                check_parent_cycle(&tx, task_id, parent)?;
            }

            if let Some(ref title) = update.title {
                task.title = title.clone();
            }
            if let Some(ref description) = update.description {
                task.description = description.clone();
            }
            if let Some(ref parent) = update.parent {
                task.parent = parent.clone();
            }
            if let Some(state) = update.state {
                task.state = state;
            }
            task.modified = modified;

            tx.execute(
                "UPDATE tasks SET title = ?1, description = ?2, state = ?3, modified = ?4, parent = ?5
                 WHERE id = ?6",
                params![
                    task.title,
                    task.description,
                    task.state.as_str(),
                    task.modified,
                    task.parent,
                    task_id,
                ],
            )?;

            tx.commit()?;
            Ok(task)
        })
    }
}
