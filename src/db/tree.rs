//! Cascading operations over the task forest.
//!
//! Both cascades visit a task before any of its descendants, children in the
//! order [`get_children_internal`] returns them, and run the whole walk in a
//! single transaction: any failure rolls back every change made so far.

use super::Database;
use super::tasks::get_children_internal;
use crate::error::ServiceError;
use crate::types::TaskState;
use anyhow::Result;
use rusqlite::{Connection, params};
use std::collections::HashSet;
use tracing::info;

/// Pre-order walk from `root_id` using an explicit stack.
///
/// `visit` is applied to each node and returns the number of rows it touched;
/// zero for the root means the root does not exist. Children are looked up by
/// parent id after the visit, so a visit may remove the node itself.
fn walk_tree<F>(conn: &Connection, root_id: &str, mut visit: F) -> Result<Vec<String>>
where
    F: FnMut(&Connection, &str) -> Result<usize>,
{
    let mut visited = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![root_id.to_string()];

    while let Some(id) = stack.pop() {
        // Guards against stored parent cycles
        if !seen.insert(id.clone()) {
            continue;
        }

        let touched = visit(conn, &id)?;
        if touched == 0 && id == root_id {
            return Err(ServiceError::task_not_found(root_id).into());
        }
        visited.push(id.clone());

        let children = get_children_internal(conn, &id)?;
        stack.extend(children.into_iter().rev().map(|child| child.id));
    }

    Ok(visited)
}

impl Database {
    /// Delete a task and all of its descendants.
    ///
    /// Returns the deleted ids, root first. Fails with `TaskNotFound` if the
    /// root does not exist.
    pub fn delete_task_tree(&self, root_id: &str) -> Result<Vec<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let deleted = walk_tree(&tx, root_id, |conn, id| {
                let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
                Ok(removed)
            })?;

            tx.commit()?;

            for id in &deleted {
                info!(id = %id, "deleted task");
            }
            Ok(deleted)
        })
    }

    /// Mark a task and all of its descendants completed.
    ///
    /// Returns the affected ids, root first. Completing an already completed
    /// tree is a no-op that still reports every id.
    pub fn complete_task_tree(&self, root_id: &str, modified: i64) -> Result<Vec<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let completed = walk_tree(&tx, root_id, |conn, id| {
                let updated = conn.execute(
                    "UPDATE tasks SET state = ?1, modified = ?2 WHERE id = ?3",
                    params![TaskState::Completed.as_str(), modified, id],
                )?;
                Ok(updated)
            })?;

            tx.commit()?;

            info!(id = %root_id, count = completed.len(), "completed task tree");
            Ok(completed)
        })
    }
}
