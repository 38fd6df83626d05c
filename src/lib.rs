//! Project Rollup Library
//!
//! Aggregates project schedule lines by serial number and builds outline-based
//! analysis rollups. Records are read through [`provider::TaskRecordProvider`],
//! so the same logic runs against any schedule source.

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod outline;
pub mod progress;
pub mod provider;
pub mod snapshot;
pub mod types;
pub mod updates;

pub use aggregate::aggregate;
pub use analysis::build_analysis_tree;
pub use config::RollupConfig;
pub use error::{ErrorCode, RollupError, RollupResult};
pub use outline::{find_range, find_sub_range};
pub use provider::{FieldUpdate, FieldValue, SharedSheet, TaskField, TaskRecordProvider, TaskSheet};
pub use types::{Aggregation, OutlineRange, TaskRecord};
