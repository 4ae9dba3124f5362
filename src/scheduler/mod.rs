//! Recurring task scheduling.
//!
//! - [`engine`]: one [`RecurrenceLoop`] per scheduled task, polling its
//!   availability expression and materializing tasks.
//! - [`registry`]: the [`ScheduleRegistry`] owning every loop's cancellation
//!   handle and running the create, update, delete and recover protocols.

pub mod engine;
pub mod registry;

pub use engine::{LoopTiming, RecurrenceLoop};
pub use registry::ScheduleRegistry;
