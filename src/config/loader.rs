//! Configuration loader with tier-based merging.
//!
//! Loads the defaults, at most one YAML file and the `TODO_*` environment
//! variables, and merges them field by field.

use super::merge::{deep_merge_all, env_overlay};
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment variables that override config fields.
pub const ENV_PREFIX: &str = "TODO_";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TODO_CONFIG_PATH";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults
    Defaults = 0,
    /// The config file, explicit or discovered
    File = 1,
    /// `TODO_*` environment variables
    Environment = 2,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::File => write!(f, "file"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Places searched for a config file when none is given explicitly.
///
/// `./todo.yaml` first, then `<config dir>/todo/config.yaml`.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("todo.yaml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("todo").join("config.yaml"));
    }
    paths
}

/// Resolved configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    config_path: Option<PathBuf>,
    tiers: Vec<ConfigTier>,
}

impl ConfigLoader {
    /// Load from the real environment.
    ///
    /// `explicit` (from `--config`) wins over `TODO_CONFIG_PATH`, which wins
    /// over the search paths.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        Self::load_from(explicit.as_deref(), &default_search_paths(), std::env::vars())
    }

    /// Load with every input supplied by the caller.
    ///
    /// An explicit path must exist. Search paths that do not exist are
    /// skipped, and only the first one found is read.
    pub fn load_from<I>(explicit: Option<&Path>, search_paths: &[PathBuf], vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut tiers = vec![ConfigTier::Defaults];

        let config_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => search_paths.iter().find(|p| p.is_file()).cloned(),
        };

        if let Some(path) = &config_path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            debug!(path = %path.display(), "loaded config file");
            layers.push(value);
            tiers.push(ConfigTier::File);
        }

        let vars = vars.into_iter().filter(|(name, _)| name != CONFIG_PATH_ENV);
        let env = env_overlay(ENV_PREFIX, vars);
        if env.as_object().is_some_and(|map| !map.is_empty()) {
            layers.push(env);
            tiers.push(ConfigTier::Environment);
        }

        let config: Config = serde_json::from_value(deep_merge_all(layers))
            .context("invalid configuration")?;
        config.validate()?;

        Ok(Self {
            config,
            config_path,
            tiers,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// The config file that was read, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Tiers that contributed, lowest first.
    pub fn tiers(&self) -> &[ConfigTier] {
        &self.tiers
    }
}
