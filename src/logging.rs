//! Tracing subscriber setup.
//!
//! Verbosity is an explicit option handed to [`init_logging`]; per-line scan
//! events are additionally gated by [`crate::config::RollupConfig::verbose`].

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    /// Append to a file, without ANSI colors.
    File(PathBuf),
}

impl LogTarget {
    /// Parse `0`/`off`, `1`/`stdout`, `2`/`stderr`, or a file name.
    pub fn parse(s: &str) -> Self {
        match s {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            filename => LogTarget::File(PathBuf::from(filename)),
        }
    }
}

/// Logging options.
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub target: LogTarget,
    /// DEBUG instead of INFO.
    pub verbose: bool,
    /// Honor `RUST_LOG` when set.
    pub use_env_filter: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            target: LogTarget::Stderr,
            verbose: false,
            use_env_filter: true,
        }
    }
}

impl LogOptions {
    pub fn level(&self) -> Level {
        if self.verbose { Level::DEBUG } else { Level::INFO }
    }

    fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level().as_str());
        if self.use_env_filter {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
        } else {
            fallback()
        }
    }
}

/// Install the global tracing subscriber. Fails if one is already installed.
pub fn init_logging(options: &LogOptions) -> Result<()> {
    match &options.target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(options.filter())
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(options.filter())
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(options.filter())
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_targets() {
        assert_eq!(LogTarget::parse("0"), LogTarget::Off);
        assert_eq!(LogTarget::parse("stdout"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("2"), LogTarget::Stderr);
        assert_eq!(
            LogTarget::parse("rollup.log"),
            LogTarget::File(PathBuf::from("rollup.log"))
        );
    }

    #[test]
    fn verbose_selects_debug() {
        let options = LogOptions {
            verbose: true,
            ..LogOptions::default()
        };
        assert_eq!(options.level(), Level::DEBUG);
        assert_eq!(LogOptions::default().level(), Level::INFO);
    }

    #[test]
    fn off_installs_nothing() {
        let options = LogOptions {
            target: LogTarget::Off,
            ..LogOptions::default()
        };
        assert!(init_logging(&options).is_ok());
    }
}
