//! Tracks the running recurrence loop of every scheduled task.
//!
//! One registry is built at startup and shared by all request handlers. The
//! id to handle map sits behind a mutex, and every loop, whether started by
//! `create`, `update` or `recover`, is started and registered through
//! [`ScheduleRegistry::start_loop`] so any of them can later be cancelled.

use super::engine::{LoopTiming, RecurrenceLoop};
use crate::avail::Availability;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::types::{ScheduledTask, ScheduledTaskUpdate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningLoop {
    fn stop(self) -> JoinHandle<()> {
        self.cancel.cancel();
        self.handle
    }
}

/// Owner of all scheduled task loops.
pub struct ScheduleRegistry {
    db: Arc<Database>,
    timing: LoopTiming,
    loops: Mutex<HashMap<String, RunningLoop>>,
}

impl ScheduleRegistry {
    pub fn new(db: Arc<Database>, timing: LoopTiming) -> Self {
        Self {
            db,
            timing,
            loops: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> ServiceResult<MutexGuard<'_, HashMap<String, RunningLoop>>> {
        self.loops
            .lock()
            .map_err(|_| ServiceError::internal("schedule registry lock poisoned"))
    }

    /// Start a loop for `scheduled` and register its handle, replacing (and
    /// cancelling) any loop already registered under the same id.
    fn start_loop(
        &self,
        loops: &mut HashMap<String, RunningLoop>,
        scheduled: ScheduledTask,
        availability: Availability,
    ) {
        let id = scheduled.id.clone();
        let cancel = CancellationToken::new();
        let handle = RecurrenceLoop::new(
            Arc::clone(&self.db),
            scheduled,
            availability,
            self.timing,
            cancel.clone(),
        )
        .spawn();

        if let Some(previous) = loops.insert(id.clone(), RunningLoop { cancel, handle }) {
            previous.cancel.cancel();
            debug!(scheduled_task_id = %id, "replaced running loop");
        }
    }

    /// Instances are filed under `parent`, so a non-empty parent must exist.
    fn require_parent(&self, parent: &str) -> ServiceResult<()> {
        if !parent.is_empty() && self.db.get_task(parent)?.is_none() {
            return Err(ServiceError::task_not_found(parent).with_field("parent"));
        }
        Ok(())
    }

    /// Validate, persist and start a new scheduled task.
    pub fn create(
        &self,
        title: &str,
        description: &str,
        parent: &str,
        expression: &str,
    ) -> ServiceResult<ScheduledTask> {
        self.create_with(ScheduledTask::new(title, description, parent, expression))
    }

    /// Like [`create`](Self::create) but keeps the id already set on `scheduled`.
    ///
    /// The row is written before the loop starts, so a duplicate id fails with
    /// `AlreadyExists` without leaving a loop behind.
    pub fn create_with(&self, scheduled: ScheduledTask) -> ServiceResult<ScheduledTask> {
        if scheduled.title.is_empty() {
            return Err(ServiceError::missing_field("title"));
        }
        if scheduled.expression.is_empty() {
            return Err(ServiceError::missing_field("expression"));
        }
        let availability =
            Availability::parse(&scheduled.expression).map_err(ServiceError::invalid_expression)?;
        self.require_parent(&scheduled.parent)?;

        let mut loops = self.lock()?;
        self.db.insert_scheduled_task(&scheduled)?;
        self.start_loop(&mut loops, scheduled.clone(), availability);

        info!(
            scheduled_task_id = %scheduled.id,
            expression = %scheduled.expression,
            "created scheduled task"
        );
        Ok(scheduled)
    }

    /// Update a scheduled task's stored fields.
    ///
    /// A running loop is restarted from the updated row so it picks up the new
    /// expression and template fields. Schedules without a running loop stay
    /// stopped.
    pub fn update(&self, id: &str, update: &ScheduledTaskUpdate) -> ServiceResult<ScheduledTask> {
        if id.is_empty() {
            return Err(ServiceError::missing_field("id"));
        }
        if let Some(title) = &update.title
            && title.is_empty()
        {
            return Err(ServiceError::invalid_value("title", "title cannot be empty"));
        }
        let availability = match &update.expression {
            Some(expression) => Some(
                Availability::parse(expression).map_err(ServiceError::invalid_expression)?,
            ),
            None => None,
        };
        if let Some(parent) = &update.parent {
            self.require_parent(parent)?;
        }

        let mut loops = self.lock()?;
        let updated = self.db.update_scheduled_task(id, update)?;

        if loops.contains_key(id) {
            let availability = match availability {
                Some(parsed) => parsed,
                None => Availability::parse(&updated.expression)
                    .map_err(ServiceError::invalid_expression)?,
            };
            self.start_loop(&mut loops, updated.clone(), availability);
            debug!(scheduled_task_id = %id, "restarted loop after update");
        }

        info!(scheduled_task_id = %id, "updated scheduled task");
        Ok(updated)
    }

    /// Delete a scheduled task and cancel its loop.
    ///
    /// The stored row decides existence. The loop is cancelled only after the
    /// row is gone, so a failed delete leaves the schedule fully intact.
    pub fn delete(&self, id: &str) -> ServiceResult<String> {
        if id.is_empty() {
            return Err(ServiceError::missing_field("id"));
        }

        let mut loops = self.lock()?;
        let removed = self.db.delete_scheduled_task(id).map_err(|e| {
            ServiceError::internal(format!("could not delete scheduled task; {}", e))
        })?;

        let running = loops.remove(id);
        if let Some(running) = running {
            running.cancel.cancel();
            if !removed {
                warn!(scheduled_task_id = %id, "cancelled loop of missing scheduled task");
            }
        }
        if !removed {
            return Err(ServiceError::scheduled_task_not_found(id));
        }

        info!(scheduled_task_id = %id, "deleted scheduled task");
        Ok(id.to_string())
    }

    /// Start a loop for every stored scheduled task. Called once at startup.
    ///
    /// Rows with an unparseable expression are logged and skipped; rows that
    /// already have a loop are left alone. Returns the number of loops started.
    pub fn recover(&self) -> ServiceResult<usize> {
        let stored = self.db.all_scheduled_tasks()?;
        let mut loops = self.lock()?;
        let mut started = 0;

        for scheduled in stored {
            if loops.contains_key(&scheduled.id) {
                continue;
            }
            match Availability::parse(&scheduled.expression) {
                Ok(availability) => {
                    debug!(scheduled_task_id = %scheduled.id, "recovered scheduled task");
                    self.start_loop(&mut loops, scheduled, availability);
                    started += 1;
                }
                Err(e) => {
                    warn!(
                        scheduled_task_id = %scheduled.id,
                        expression = %scheduled.expression,
                        error = %e,
                        "skipping scheduled task with invalid expression"
                    );
                }
            }
        }

        info!(count = started, "recovered scheduled tasks");
        Ok(started)
    }

    /// Ids with a running loop, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = match self.loops.lock() {
            Ok(loops) => loops.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        ids.sort();
        ids
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.loops
            .lock()
            .map(|loops| loops.contains_key(id))
            .unwrap_or(false)
    }

    /// Cancel every loop and wait for all of them to exit.
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = match self.loops.lock() {
            Ok(mut loops) => loops.drain().map(|(_, running)| running.stop()).collect(),
            Err(_) => Vec::new(),
        };

        let count = handles.len();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "scheduled task loop ended abnormally");
            }
        }
        info!(count, "stopped scheduled task loops");
    }
}
