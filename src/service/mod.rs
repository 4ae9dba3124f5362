//! Request-level operations shared by every transport.
//!
//! [`TodoService`] validates requests, calls into storage and the schedule
//! registry, and turns storage errors into [`ServiceError`]s. The HTTP layer
//! is a thin mapping on top of it.

pub mod scheduled_tasks;
pub mod tasks;

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::scheduler::ScheduleRegistry;
use crate::types::{ScheduledTask, Task};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use scheduled_tasks::{CreateScheduledTaskRequest, ListQuery};
pub use tasks::{CreateTaskRequest, ListTasksQuery};

/// Build and runtime information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub version: String,
    pub commit: String,
    pub dev_mode_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdsResponse {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTaskResponse {
    pub scheduled_task: ScheduledTask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTasksResponse {
    pub scheduled_tasks: Vec<ScheduledTask>,
}

/// Body of successful update responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// Entry point for all task and scheduled task operations.
#[derive(Clone)]
pub struct TodoService {
    db: Arc<Database>,
    registry: Arc<ScheduleRegistry>,
    dev_mode: bool,
}

impl TodoService {
    pub fn new(db: Arc<Database>, registry: Arc<ScheduleRegistry>, dev_mode: bool) -> Self {
        Self {
            db,
            registry,
            dev_mode,
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn registry(&self) -> &Arc<ScheduleRegistry> {
        &self.registry
    }

    pub fn system_info(&self) -> SystemInfo {
        SystemInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("TODO_GIT_COMMIT")
                .unwrap_or("unknown")
                .to_string(),
            dev_mode_enabled: self.dev_mode,
        }
    }
}

/// Reject an empty value for a required field.
pub(crate) fn require(field: &str, value: &str) -> ServiceResult<()> {
    if value.is_empty() {
        return Err(ServiceError::missing_field(field));
    }
    Ok(())
}
