//! Configuration types and structures.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level used when `RUST_LOG` is not set (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub development: DevelopmentConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            development: DevelopmentConfig::default(),
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Conveniences for local development.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentConfig {
    /// Human-friendly multi-line log output.
    #[serde(default)]
    pub pretty_logging: bool,
}

/// HTTP server and storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. `localhost:8080`.
    #[serde(default = "default_host")]
    pub host: String,

    /// How long in-flight requests may take to finish after a shutdown signal.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Path to the SQLite database file.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Most rows a list request returns, also used when no limit is given.
    #[serde(default = "default_storage_results_limit")]
    pub storage_results_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            storage_path: default_storage_path(),
            storage_results_limit: default_storage_results_limit(),
        }
    }
}

impl ServerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Recurring task loop timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Wait before a new loop's first evaluation.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    /// Time between evaluations.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: default_settle_delay_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "localhost:8080".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    15
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("/tmp/todo.db")
}

fn default_storage_results_limit() -> usize {
    200
}

fn default_settle_delay_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    60
}

impl Config {
    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(anyhow!("server.host must not be empty"));
        }
        if self.server.storage_results_limit == 0 {
            return Err(anyhow!("server.storage_results_limit must be at least 1"));
        }
        if self.scheduler.poll_interval_secs == 0 {
            return Err(anyhow!("scheduler.poll_interval_secs must be at least 1"));
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_storage_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.storage_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Whether any development convenience is switched on.
    pub fn dev_mode_enabled(&self) -> bool {
        self.development.pretty_logging
    }
}
