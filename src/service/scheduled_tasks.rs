//! Scheduled task operations. Writes go through the [`ScheduleRegistry`] so
//! stored rows and running loops stay in step.
//!
//! [`ScheduleRegistry`]: crate::scheduler::ScheduleRegistry

use super::{
    Empty, IdResponse, ScheduledTaskResponse, ScheduledTasksResponse, TodoService, require,
};
use crate::error::{ServiceError, ServiceResult};
use crate::types::ScheduledTaskUpdate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateScheduledTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

impl TodoService {
    pub fn create_scheduled_task(
        &self,
        request: CreateScheduledTaskRequest,
    ) -> ServiceResult<IdResponse> {
        let scheduled = self.registry.create(
            &request.title,
            &request.description,
            &request.parent,
            &request.expression,
        )?;
        Ok(IdResponse { id: scheduled.id })
    }

    pub fn get_scheduled_task(&self, id: &str) -> ServiceResult<ScheduledTaskResponse> {
        require("id", id)?;
        let scheduled_task = self
            .db
            .get_scheduled_task(id)?
            .ok_or_else(|| ServiceError::scheduled_task_not_found(id))?;
        Ok(ScheduledTaskResponse { scheduled_task })
    }

    pub fn list_scheduled_tasks(&self, query: &ListQuery) -> ServiceResult<ScheduledTasksResponse> {
        let scheduled_tasks = self.db.list_scheduled_tasks(query.offset, query.limit)?;
        Ok(ScheduledTasksResponse { scheduled_tasks })
    }

    pub fn update_scheduled_task(
        &self,
        id: &str,
        update: &ScheduledTaskUpdate,
    ) -> ServiceResult<Empty> {
        self.registry.update(id, update)?;
        Ok(Empty {})
    }

    pub fn delete_scheduled_task(&self, id: &str) -> ServiceResult<IdResponse> {
        let id = self.registry.delete(id)?;
        Ok(IdResponse { id })
    }
}
