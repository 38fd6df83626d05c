//! Rollup configuration.
//!
//! Configuration is merged field-by-field from these tiers:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/project-rollup/config.yaml`
//! 3. **User** - `~/.project-rollup/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `PROJECT_ROLLUP_CONFIG_PATH` - Explicit config file (replaces tiers 2-3)
//! - `PROJECT_ROLLUP_PROJECT_DIR` - Project config dir (default: `./project-rollup`)
//! - `PROJECT_ROLLUP_USER_DIR` - User config dir (default: `~/.project-rollup`)
//! - `PROJECT_ROLLUP_VERBOSE` - `1`/`true` enables per-line scan logging
//! - `PROJECT_ROLLUP_ANALYSIS_PREFIX` - Serial prefix of analysis items

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
