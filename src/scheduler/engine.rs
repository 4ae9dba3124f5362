//! The per-schedule evaluation loop.

use crate::avail::Availability;
use crate::config::SchedulerConfig;
use crate::db::Database;
use crate::types::ScheduledTask;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Waits used by every recurrence loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// Delay before the first evaluation, so a schedule created inside an
    /// eligible minute does not fire for it immediately.
    pub settle_delay: Duration,
    /// Time between evaluations.
    pub poll_interval: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(60),
            poll_interval: Duration::from_secs(60),
        }
    }
}

impl From<&SchedulerConfig> for LoopTiming {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            settle_delay: Duration::from_secs(config.settle_delay_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        }
    }
}

/// Materializes tasks for one scheduled task until cancelled.
pub struct RecurrenceLoop {
    db: Arc<Database>,
    schedule: ScheduledTask,
    availability: Availability,
    timing: LoopTiming,
    cancel: CancellationToken,
}

impl RecurrenceLoop {
    pub fn new(
        db: Arc<Database>,
        schedule: ScheduledTask,
        availability: Availability,
        timing: LoopTiming,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            schedule,
            availability,
            timing,
            cancel,
        }
    }

    /// Spawn the loop onto the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until the cancellation token fires.
    ///
    /// Cancellation is only observed while waiting, so an insert that has
    /// started always finishes.
    pub async fn run(self) {
        debug!(scheduled_task_id = %self.schedule.id, "scheduled task processing started");

        let mut wait = self.timing.settle_delay;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(scheduled_task_id = %self.schedule.id, "scheduled task processing cancelled");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            self.tick(Utc::now());
            wait = self.timing.poll_interval;
        }
    }

    /// Evaluate one instant, inserting a new task if it is eligible.
    ///
    /// Returns the id of the created task. Insert failures are logged and
    /// swallowed.
    pub fn tick(&self, now: DateTime<Utc>) -> Option<String> {
        if !self.availability.is_eligible(now) {
            return None;
        }

        let task = self.schedule.instantiate();
        match self.db.insert_task(&task) {
            Ok(()) => {
                debug!(
                    id = %task.id,
                    title = %task.title,
                    scheduled_task_id = %self.schedule.id,
                    "scheduled a new task"
                );
                Some(task.id)
            }
            Err(e) => {
                error!(
                    scheduled_task_id = %self.schedule.id,
                    error = %e,
                    "could not create task"
                );
                None
            }
        }
    }
}
