//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::RollupConfig;
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    /// `$CWD/project-rollup/config.yaml`
    Project = 1,
    /// `~/.project-rollup/config.yaml`
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let user_dir = std::env::var("PROJECT_ROLLUP_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".project-rollup")));

        let project_dir = std::env::var("PROJECT_ROLLUP_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("project-rollup")));

        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Loads [`RollupConfig`] from defaults, project, user and environment tiers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: RollupConfig,
    /// Files that contributed, lowest tier first.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        // An explicit file replaces tier discovery entirely
        if let Ok(explicit_path) = std::env::var("PROJECT_ROLLUP_CONFIG_PATH") {
            let path = PathBuf::from(&explicit_path);
            let mut config = RollupConfig::load(&path)?;
            Self::apply_env_overrides(&mut config);
            return Ok(Self {
                paths,
                config,
                sources: vec![(ConfigTier::Environment, path)],
            });
        }

        let mut layers: Vec<Value> = vec![serde_json::to_value(RollupConfig::default())?];
        let mut sources = Vec::new();

        let tiers = [
            (ConfigTier::Project, paths.project_dir.as_deref()),
            (ConfigTier::User, paths.user_dir.as_deref()),
        ];
        for (tier, dir) in tiers {
            let Some(dir) = dir else { continue };
            let file = dir.join("config.yaml");
            if let Some(layer) = read_layer(&file, tier) {
                layers.push(layer);
                sources.push((tier, file));
            }
        }

        let merged = deep_merge_all(layers);
        let mut config: RollupConfig = serde_json::from_value(merged)?;
        Self::apply_env_overrides(&mut config);

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut RollupConfig) {
        if let Ok(verbose) = std::env::var("PROJECT_ROLLUP_VERBOSE") {
            config.verbose = matches!(verbose.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        if let Ok(prefix) = std::env::var("PROJECT_ROLLUP_ANALYSIS_PREFIX") {
            config.analysis_prefix = prefix;
        }
    }

    pub fn config(&self) -> &RollupConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RollupConfig {
        &mut self.config
    }

    pub fn into_config(self) -> RollupConfig {
        self.config
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read one tier's YAML file. Missing files are silent; unreadable ones are logged and skipped.
fn read_layer(file: &Path, tier: ConfigTier) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(tier = %tier, path = %file.display(), error = %e, "cannot read config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(tier = %tier, path = %file.display(), "loaded config layer");
            Some(value)
        }
        Err(e) => {
            warn!(tier = %tier, path = %file.display(), error = %e, "invalid config YAML, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisWindow;
    use tempfile::TempDir;

    #[test]
    fn load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().analysis_prefix, "AN-");
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("project-rollup");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(
            project_dir.join("config.yaml"),
            "analysis_prefix: \"REQ-\"\nanalysis_window: root_anchored\n",
        )
        .unwrap();
        std::fs::write(user_dir.join("config.yaml"), "analysis_prefix: \"AN-\"\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir));
        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.analysis_prefix, "AN-");
        assert_eq!(config.analysis_window, AnalysisWindow::RootAnchored);
        assert_eq!(loader.sources().len(), 2);
        assert_eq!(loader.sources()[0].0, ConfigTier::Project);
    }

    #[test]
    fn invalid_yaml_layer_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("project-rollup");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "verbose: [unclosed\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert!(!loader.config().verbose);
        assert!(loader.sources().is_empty());
    }
}
