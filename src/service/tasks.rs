//! Task operations.

use super::{Empty, IdResponse, IdsResponse, TaskResponse, TasksResponse, TodoService, require};
use crate::db::now_ms;
use crate::error::{ServiceError, ServiceResult};
use crate::types::{Task, TaskUpdate};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: String,
}

/// Paging for task lists. A zero limit means "as many as allowed".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub exclude_completed: bool,
}

impl TodoService {
    pub fn create_task(&self, request: CreateTaskRequest) -> ServiceResult<IdResponse> {
        require("title", &request.title)?;
        if !request.parent.is_empty() && self.db.get_task(&request.parent)?.is_none() {
            return Err(ServiceError::task_not_found(&request.parent).with_field("parent"));
        }

        let task = Task::new(request.title, request.description, request.parent);
        self.db.insert_task(&task)?;

        info!(id = %task.id, parent = %task.parent, "created task");
        Ok(IdResponse { id: task.id })
    }

    pub fn get_task(&self, id: &str) -> ServiceResult<TaskResponse> {
        require("id", id)?;
        let task = self
            .db
            .get_task(id)?
            .ok_or_else(|| ServiceError::task_not_found(id))?;
        Ok(TaskResponse { task })
    }

    pub fn list_tasks(&self, query: &ListTasksQuery) -> ServiceResult<TasksResponse> {
        let tasks = self
            .db
            .list_tasks(query.offset, query.limit, query.exclude_completed)?;
        Ok(TasksResponse { tasks })
    }

    pub fn update_task(&self, id: &str, update: &TaskUpdate) -> ServiceResult<Empty> {
        require("id", id)?;
        if let Some(title) = &update.title
            && title.is_empty()
        {
            return Err(ServiceError::invalid_value("title", "title cannot be empty"));
        }

        self.db.update_task(id, update, now_ms())?;
        info!(id = %id, "updated task");
        Ok(Empty {})
    }

    /// Delete a task and its whole subtree.
    pub fn delete_task(&self, id: &str) -> ServiceResult<IdsResponse> {
        require("id", id)?;
        let ids = self.db.delete_task_tree(id)?;
        Ok(IdsResponse { ids })
    }

    /// Complete a task and its whole subtree.
    pub fn complete_task(&self, id: &str) -> ServiceResult<IdsResponse> {
        require("id", id)?;
        let ids = self.db.complete_task_tree(id, now_ms())?;
        Ok(IdsResponse { ids })
    }
}
