//! Configuration types.

use crate::types::DEFAULT_IGNORE_MARKER;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default serial prefix marking an analysis item.
pub const DEFAULT_ANALYSIS_PREFIX: &str = "AN-";

/// Default format for textual dates in write-back operations.
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d";

/// Which lines the analysis tree builder scans below its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisWindow {
    /// Start one line before the resolved range and stop at its last line,
    /// inclusive. For a root with children the first line is the root itself;
    /// for a childless root it is the line above it. The older rollup macros
    /// also left out the last line of the range; this window keeps it.
    #[default]
    Legacy,
    /// Always start at the root line.
    RootAnchored,
}

/// Options shared by every rollup operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Value of the ignore column that excludes a line (case-insensitive).
    #[serde(default = "default_ignore_marker")]
    pub ignore_marker: String,

    /// Serial prefix of analysis items (case-insensitive).
    #[serde(default = "default_analysis_prefix")]
    pub analysis_prefix: String,

    #[serde(default)]
    pub analysis_window: AnalysisWindow,

    /// chrono format for textual dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Emit a debug event for every line classified during a scan.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            ignore_marker: default_ignore_marker(),
            analysis_prefix: default_analysis_prefix(),
            analysis_window: AnalysisWindow::default(),
            date_format: default_date_format(),
            verbose: false,
        }
    }
}

fn default_ignore_marker() -> String {
    DEFAULT_IGNORE_MARKER.to_string()
}

fn default_analysis_prefix() -> String {
    DEFAULT_ANALYSIS_PREFIX.to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl RollupConfig {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RollupConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_analysis_window(mut self, window: AnalysisWindow) -> Self {
        self.analysis_window = window;
        self
    }

    /// True when `serial` starts with the analysis prefix, ignoring ASCII case.
    pub fn is_analysis_serial(&self, serial: &str) -> bool {
        let prefix = self.analysis_prefix.as_bytes();
        serial.len() >= prefix.len() && serial.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_schedule_conventions() {
        let config = RollupConfig::default();
        assert_eq!(config.ignore_marker, "ignore");
        assert_eq!(config.analysis_prefix, "AN-");
        assert_eq!(config.analysis_window, AnalysisWindow::Legacy);
        assert!(!config.verbose);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: RollupConfig = serde_yaml::from_str("analysis_window: root_anchored\n").unwrap();
        assert_eq!(config.analysis_window, AnalysisWindow::RootAnchored);
        assert_eq!(config.date_format, "%Y/%m/%d");
    }

    #[test]
    fn analysis_prefix_ignores_case() {
        let config = RollupConfig::default();
        assert!(config.is_analysis_serial("an-12"));
        assert!(config.is_analysis_serial("AN-"));
        assert!(!config.is_analysis_serial("A"));
        assert!(!config.is_analysis_serial("QA-1"));
    }
}
