//! Core types for the todo service.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of generated task and scheduled task ids.
pub const ID_LENGTH: usize = 8;

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a short random identifier from `[a-z0-9]`.
pub fn new_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Unset or unrecognized state.
    #[default]
    Unknown,
    Unresolved,
    Completed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Unknown => "UNKNOWN",
            TaskState::Unresolved => "UNRESOLVED",
            TaskState::Completed => "COMPLETED",
        }
    }

    /// Parse a stored state string. Anything unrecognized maps to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "UNRESOLVED" => TaskState::Unresolved,
            "COMPLETED" => TaskState::Completed,
            _ => TaskState::Unknown,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single actionable item, optionally nested under a parent task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub state: TaskState,
    /// Milliseconds since epoch, set once at creation.
    pub created: i64,
    /// Milliseconds since epoch of the last update, zero until then.
    pub modified: i64,
    /// Parent task id, empty for root tasks.
    pub parent: String,
}

impl Task {
    /// Build a fresh unresolved task with a generated id.
    pub fn new(title: impl Into<String>, description: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: description.into(),
            state: TaskState::Unresolved,
            created: crate::db::now_ms(),
            modified: 0,
            parent: parent.into(),
        }
    }
}

/// A template that periodically materializes new tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Task under which materialized instances are filed, empty for root.
    pub parent: String,
    /// Availability expression deciding when a new instance is created.
    pub expression: String,
}

impl ScheduledTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        parent: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: description.into(),
            parent: parent.into(),
            expression: expression.into(),
        }
    }

    /// Materialize a new task instance from this template.
    pub fn instantiate(&self) -> Task {
        Task::new(&self.title, &self.description, &self.parent)
    }
}

/// Fields of a task that an update may change. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub state: Option<TaskState>,
}

/// Fields of a scheduled task that an update may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub expression: Option<String>,
}
