//! Core types for task records and their rollups.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Seconds since the Unix epoch.
pub type Timestamp = i64;

/// Default marker placed in the ignore column to exclude a line.
pub const DEFAULT_IGNORE_MARKER: &str = "ignore";

/// One line of a project schedule.
///
/// Text columns default to empty so that partially filled rows still load;
/// only `id` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Helper column: `ignore` excludes the line, any other value is its category.
    #[serde(default)]
    pub ignore_flag: String,
    /// Comma-separated serial numbers.
    #[serde(default)]
    pub serial_field: String,
    /// Comma-separated resource names.
    #[serde(default)]
    pub resource_names: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub release_name: String,
    #[serde(default)]
    pub qc_database: String,
    #[serde(default)]
    pub qc_release: String,
    #[serde(default)]
    pub start: Timestamp,
    #[serde(default)]
    pub finish: Timestamp,
    #[serde(default)]
    pub deadline: Option<Timestamp>,
    #[serde(default, deserialize_with = "de_percent")]
    pub percent_work_complete: u8,
    #[serde(default)]
    pub outline_number: String,
    #[serde(default)]
    pub predecessor_count: u32,
    #[serde(default)]
    pub child_count: u32,
    #[serde(default)]
    pub work: f64,
    #[serde(default)]
    pub actual_work: f64,
}

fn de_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = u8::deserialize(deserializer)?;
    if value > 100 {
        return Err(serde::de::Error::custom(format!(
            "percent_work_complete must be 0-100, got {}",
            value
        )));
    }
    Ok(value)
}

impl TaskRecord {
    /// Create a blank record with the given id.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
            ignore_flag: String::new(),
            serial_field: String::new(),
            resource_names: String::new(),
            priority: String::new(),
            release_name: String::new(),
            qc_database: String::new(),
            qc_release: String::new(),
            start: 0,
            finish: 0,
            deadline: None,
            percent_work_complete: 0,
            outline_number: String::new(),
            predecessor_count: 0,
            child_count: 0,
            work: 0.0,
            actual_work: 0.0,
        }
    }

    /// True when the ignore column equals `marker`, ignoring case and surrounding spaces.
    pub fn is_ignored(&self, marker: &str) -> bool {
        self.ignore_flag.trim().eq_ignore_ascii_case(marker)
    }

    pub fn has_serial(&self) -> bool {
        !self.serial_field.trim().is_empty()
    }

    pub fn has_resources(&self) -> bool {
        !self.resource_names.trim().is_empty()
    }

    /// Individual serial numbers listed in the serial column.
    pub fn serial_tokens(&self) -> Vec<&str> {
        split_list(&self.serial_field)
    }

    /// Individual resource names listed in the resource column.
    pub fn resource_tokens(&self) -> Vec<&str> {
        split_list(&self.resource_names)
    }

    /// True when the serial column lists more than one serial number.
    pub fn is_compound(&self) -> bool {
        self.serial_field.split(',').count() > 1
    }

    pub fn duration(&self) -> Timestamp {
        self.finish - self.start
    }

    /// Depth in the outline, `"3.2.1"` being level 3.
    pub fn outline_level(&self) -> usize {
        crate::outline::outline_level(&self.outline_number)
    }
}

/// Split a comma-separated column, trimming pieces and dropping empty ones.
pub fn split_list(field: &str) -> Vec<&str> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// One logical unit of work merged from every line carrying the same serial number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedTask {
    pub serial: String,
    pub name: String,
    pub priority: String,
    pub release_name: String,
    pub qc_database: String,
    pub qc_release: String,
    pub resources: BTreeSet<String>,
    pub source_ids: BTreeSet<u32>,
    pub outline_numbers: BTreeSet<String>,
    pub start: Timestamp,
    pub finish: Timestamp,
    /// Percent complete of each contributing line, in scan order.
    pub percent_samples: Vec<u8>,
    /// Truncating average of `percent_samples`.
    pub percent_work_complete: u8,
}

/// A resource-less, predecessor-less, childless line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfqaCandidate {
    pub serial: String,
    pub name: String,
    pub start: Timestamp,
    pub finish: Timestamp,
    pub priority: String,
    pub release_name: String,
    pub qc_database: String,
    pub qc_release: String,
    pub source_ids: BTreeSet<u32>,
}

/// Raw serial column text mapped to the record ids that declared it.
pub type SerialIndex = BTreeMap<String, Vec<u32>>;

/// Output of one full aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub tasks: BTreeMap<String, AggregatedTask>,
    pub rfqas: BTreeMap<String, RfqaCandidate>,
    /// Lines listing more than one serial number.
    pub compound: SerialIndex,
    /// Lines with a serial number that were neither a task nor an RFQA.
    pub unclassified: SerialIndex,
}

impl Aggregation {
    pub fn task(&self, serial: &str) -> Option<&AggregatedTask> {
        self.tasks.get(serial)
    }

    pub fn rfqa(&self, serial: &str) -> Option<&RfqaCandidate> {
        self.rfqas.get(serial)
    }

    /// Record ids of the compound line with the given raw serial column.
    pub fn compound_ids(&self, raw_serial: &str) -> Option<&[u32]> {
        self.compound.get(raw_serial).map(Vec::as_slice)
    }

    /// True when `id` contributed to a task, an RFQA, or the unclassified residue.
    pub fn accounts_for(&self, id: u32) -> bool {
        self.tasks.values().any(|t| t.source_ids.contains(&id))
            || self.rfqas.values().any(|r| r.source_ids.contains(&id))
            || self.unclassified.values().any(|ids| ids.contains(&id))
    }
}

/// Inclusive range of record ids.
///
/// A childless line resolves to `(id, id)`. A line with exactly one child
/// resolves to `(child, child)`, so use [`OutlineRange::is_leaf_of`] to test
/// whether a given line is a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineRange {
    pub start: u32,
    pub end: u32,
}

impl OutlineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// True for a single-id range.
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// True when this is the collapsed range of the childless line `id`.
    pub fn is_leaf_of(&self, id: u32) -> bool {
        self.start == id && self.end == id
    }

    pub fn ids(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// A leaf line folded into an analysis entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafContribution {
    pub start: Timestamp,
    pub finish: Timestamp,
    pub work: f64,
    pub actual_work: f64,
    pub percent_work_complete: u8,
}

/// One analysis item and the leaves beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub key: String,
    pub start: Timestamp,
    pub finish: Timestamp,
    pub category: String,
    pub subrange: OutlineRange,
    pub total_work: f64,
    pub actual_work: f64,
    pub percent_samples: Vec<u8>,
    pub sub_tasks: BTreeMap<String, LeafContribution>,
}

/// A leaf as seen from its category, remembering which analysis item owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLeaf {
    #[serde(flatten)]
    pub leaf: LeafContribution,
    pub analysis_key: String,
}

/// Rollup of every analysis item sharing a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRollup {
    pub category: String,
    pub members: Vec<String>,
    pub start: Timestamp,
    pub finish: Timestamp,
    pub total_work: f64,
    pub actual_work: f64,
    pub percent_samples: Vec<u8>,
    pub sub_tasks: BTreeMap<String, CategoryLeaf>,
}

pub type CategoryRollups = BTreeMap<String, CategoryRollup>;

/// Analysis entries in the order they were discovered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisTree {
    entries: Vec<AnalysisEntry>,
}

impl AnalysisTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AnalysisEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut AnalysisEntry> {
        self.entries.iter_mut().find(|e| e.key == key)
    }

    /// Insert an entry, replacing one with the same key in place.
    pub fn insert(&mut self, entry: AnalysisEntry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Truncating integer average of percent samples.
pub fn average_percent(samples: &[u8]) -> Option<u8> {
    if samples.is_empty() {
        return None;
    }
    let total: u32 = samples.iter().map(|&p| u32::from(p)).sum();
    // Mean of values <= 100 is itself <= 100.
    Some((total / samples.len() as u32) as u8)
}

impl AnalysisEntry {
    pub fn average_percent(&self) -> Option<u8> {
        average_percent(&self.percent_samples)
    }
}

impl CategoryRollup {
    pub fn average_percent(&self) -> Option<u8> {
        average_percent(&self.percent_samples)
    }
}
