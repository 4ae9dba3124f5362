//! Todo Service Library
//!
//! Tasks, recurring scheduled tasks and the HTTP surface over them, exported
//! for the `todo` binary and for integration tests.

pub mod api;
pub mod avail;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod service;
pub mod types;
