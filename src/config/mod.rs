//! Service configuration.
//!
//! Three tiers, merged field by field:
//! 1. **Defaults** - [`Config::default`]
//! 2. **File** - `--config`, `TODO_CONFIG_PATH`, `./todo.yaml`, or
//!    `<config dir>/todo/config.yaml`, first one found
//! 3. **Environment** - `TODO_<SECTION>__<FIELD>`, e.g. `TODO_SERVER__HOST`

mod loader;
mod merge;
mod types;

pub use loader::{CONFIG_PATH_ENV, ConfigLoader, ConfigTier, ENV_PREFIX, default_search_paths};
pub use merge::{deep_merge, deep_merge_all, env_overlay};
pub use types::*;
