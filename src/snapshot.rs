//! Loading a [`TaskSheet`] from JSON or YAML snapshots.
//!
//! A snapshot is either an array of rows or an object with a `tasks` array.
//! `null` rows are blank lines. A row that does not describe a valid record is
//! skipped and reported; the rest of the snapshot still loads.

use crate::provider::TaskSheet;
use crate::types::TaskRecord;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Why a snapshot row was left out of the sheet.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("row {index} has no usable id")]
    MissingId { index: usize },
    #[error("row {index} (id {id}) is malformed: {reason}")]
    Malformed { index: usize, id: u64, reason: String },
    #[error("row {index} duplicates id {id}; the later row was kept")]
    DuplicateId { index: usize, id: u32 },
}

/// Outcome of loading a snapshot.
#[derive(Debug, Default)]
pub struct SnapshotReport {
    pub sheet: TaskSheet,
    pub skipped: Vec<RecordError>,
}

/// Snapshot file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "json" => Some(SnapshotFormat::Json),
            "yaml" | "yml" => Some(SnapshotFormat::Yaml),
            _ => None,
        }
    }
}

impl TaskSheet {
    pub fn from_json_str(content: &str) -> Result<SnapshotReport> {
        let value: Value = serde_json::from_str(content).context("snapshot is not valid JSON")?;
        load_rows(value)
    }

    pub fn from_yaml_str(content: &str) -> Result<SnapshotReport> {
        let value: Value = serde_yaml::from_str(content).context("snapshot is not valid YAML")?;
        load_rows(value)
    }

    /// Load a snapshot file; the extension selects the parser.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<SnapshotReport> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read snapshot {}", path.display()))?;
        match SnapshotFormat::from_path(path) {
            Some(SnapshotFormat::Json) => Self::from_json_str(&content),
            Some(SnapshotFormat::Yaml) => Self::from_yaml_str(&content),
            None => bail!("unknown snapshot format for {}", path.display()),
        }
    }
}

fn load_rows(value: Value) -> Result<SnapshotReport> {
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("tasks") {
            Some(Value::Array(rows)) => rows,
            _ => bail!("snapshot object has no 'tasks' array"),
        },
        _ => bail!("snapshot must be an array of rows or an object with 'tasks'"),
    };

    let mut report = SnapshotReport::default();
    for (index, row) in rows.into_iter().enumerate() {
        if row.is_null() {
            // Blank line: keep its position so ids stay aligned
            report.sheet.extend_to(u32::try_from(index + 1).unwrap_or(u32::MAX));
            continue;
        }
        match parse_row(index, row) {
            Ok(record) => {
                let id = record.id;
                if report.sheet.insert(record).is_some() {
                    let err = RecordError::DuplicateId { index, id };
                    warn!("{}", err);
                    report.skipped.push(err);
                }
            }
            Err(err) => {
                warn!("{}", err);
                report.skipped.push(err);
            }
        }
    }

    info!(
        records = report.sheet.len(),
        skipped = report.skipped.len(),
        "loaded snapshot"
    );
    Ok(report)
}

fn parse_row(index: usize, row: Value) -> std::result::Result<TaskRecord, RecordError> {
    let id = row
        .get("id")
        .and_then(Value::as_u64)
        .filter(|&id| id > 0 && id <= u64::from(u32::MAX))
        .ok_or(RecordError::MissingId { index })?;
    serde_json::from_value(row).map_err(|e| RecordError::Malformed {
        index,
        id,
        reason: e.to_string(),
    })
}
