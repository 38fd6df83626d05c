//! Task record providers.
//!
//! The rollup logic reads records through [`TaskRecordProvider`] and never
//! owns the schedule. [`TaskSheet`] is the in-memory provider; [`SharedSheet`]
//! wraps one behind a mutex so each operation runs against a stable snapshot.

use crate::error::{RollupError, RollupResult};
use crate::types::{TaskRecord, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Read and write access to an ordered, 1-based set of task lines.
pub trait TaskRecordProvider {
    /// Highest id in the schedule. Ids run from 1 to `count()`.
    fn count(&self) -> u32;

    /// Record at `id`, or `None` for a blank line or an id outside the schedule.
    fn record(&self, id: u32) -> Option<&TaskRecord>;

    /// Apply one field update to the record at `id`.
    fn set_field(&mut self, id: u32, update: &FieldUpdate) -> RollupResult<()>;

    /// Non-blank records with ids in `from..=to`, ascending.
    fn records_between(&self, from: u32, to: u32) -> Vec<&TaskRecord> {
        (from.max(1)..=to.min(self.count()))
            .filter_map(|id| self.record(id))
            .collect()
    }

    /// Every non-blank record, ascending.
    fn records(&self) -> Vec<&TaskRecord> {
        self.records_between(1, self.count())
    }
}

/// Fields that write-back operations may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskField {
    Name,
    Resources,
    Start,
    Finish,
    PercentWorkComplete,
    Priority,
    ReleaseName,
}

impl TaskField {
    pub const ALL: [TaskField; 7] = [
        TaskField::Name,
        TaskField::Resources,
        TaskField::Start,
        TaskField::Finish,
        TaskField::PercentWorkComplete,
        TaskField::Priority,
        TaskField::ReleaseName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Name => "Name",
            TaskField::Resources => "Resources",
            TaskField::Start => "Start",
            TaskField::Finish => "Finish",
            TaskField::PercentWorkComplete => "PercentWorkComplete",
            TaskField::Priority => "Priority",
            TaskField::ReleaseName => "ReleaseName",
        }
    }

    /// Names accepted by [`TaskField::parse`].
    pub fn accepted_names() -> Vec<&'static str> {
        Self::ALL.iter().map(TaskField::as_str).collect()
    }

    /// Parse a field name, failing with `UnsupportedField` for anything outside the accepted set.
    pub fn parse(name: &str) -> RollupResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| RollupError::unsupported_field(name, &Self::accepted_names()))
    }
}

/// Value carried by a field update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Percent(u8),
    Instant(Timestamp),
    Text(String),
}

/// A single field assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field: TaskField,
    pub value: FieldValue,
}

impl FieldUpdate {
    pub fn new(field: TaskField, value: FieldValue) -> Self {
        Self { field, value }
    }

    pub fn text(field: TaskField, value: impl Into<String>) -> Self {
        Self::new(field, FieldValue::Text(value.into()))
    }

    pub fn instant(field: TaskField, value: Timestamp) -> Self {
        Self::new(field, FieldValue::Instant(value))
    }

    pub fn percent(value: u8) -> Self {
        Self::new(TaskField::PercentWorkComplete, FieldValue::Percent(value))
    }

    /// Build an update from a field name, rejecting unsupported names.
    pub fn named(name: &str, value: FieldValue) -> RollupResult<Self> {
        Ok(Self::new(TaskField::parse(name)?, value))
    }

    /// Check that the value suits the field without touching any record.
    pub fn validate(&self) -> RollupResult<()> {
        let field = self.field.as_str();
        match (self.field, &self.value) {
            (
                TaskField::Name | TaskField::Resources | TaskField::Priority | TaskField::ReleaseName,
                FieldValue::Text(_),
            ) => Ok(()),
            // Small integers deserialize as Percent; accept them as instants too.
            (TaskField::Start | TaskField::Finish, FieldValue::Instant(_) | FieldValue::Percent(_)) => {
                Ok(())
            }
            (TaskField::PercentWorkComplete, FieldValue::Percent(p)) if *p > 100 => Err(
                RollupError::invalid_value(field, &format!("percent must be 0-100, got {}", p)),
            ),
            (TaskField::PercentWorkComplete, FieldValue::Percent(_)) => Ok(()),
            (_, value) => Err(RollupError::invalid_value(
                field,
                &format!("value {:?} does not fit field {}", value, field),
            )),
        }
    }

    /// Write this update into `record`. Nothing is written when validation fails.
    pub fn apply(&self, record: &mut TaskRecord) -> RollupResult<()> {
        self.validate()?;
        match (self.field, &self.value) {
            (TaskField::Name, FieldValue::Text(v)) => record.name = v.clone(),
            (TaskField::Resources, FieldValue::Text(v)) => record.resource_names = v.clone(),
            (TaskField::Priority, FieldValue::Text(v)) => record.priority = v.clone(),
            (TaskField::ReleaseName, FieldValue::Text(v)) => record.release_name = v.clone(),
            (TaskField::Start, FieldValue::Instant(t)) => record.start = *t,
            (TaskField::Finish, FieldValue::Instant(t)) => record.finish = *t,
            (TaskField::Start, FieldValue::Percent(t)) => record.start = Timestamp::from(*t),
            (TaskField::Finish, FieldValue::Percent(t)) => record.finish = Timestamp::from(*t),
            (TaskField::PercentWorkComplete, FieldValue::Percent(p)) => {
                record.percent_work_complete = *p
            }
            _ => {}
        }
        Ok(())
    }
}

/// In-memory schedule keyed by record id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSheet {
    records: BTreeMap<u32, TaskRecord>,
    count: u32,
}

impl TaskSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sheet from records; a later record with a repeated id replaces the earlier one.
    pub fn from_records(records: impl IntoIterator<Item = TaskRecord>) -> Self {
        let mut sheet = Self::new();
        for record in records {
            sheet.insert(record);
        }
        sheet
    }

    /// Insert or replace a record, returning the one it replaced.
    pub fn insert(&mut self, record: TaskRecord) -> Option<TaskRecord> {
        self.count = self.count.max(record.id);
        self.records.insert(record.id, record)
    }

    /// Reserve ids up to `count` so trailing blank lines are part of the schedule.
    pub fn extend_to(&mut self, count: u32) {
        self.count = self.count.max(count);
    }

    /// Mutable access to a record, bypassing the field whitelist.
    pub fn record_mut(&mut self, id: u32) -> Option<&mut TaskRecord> {
        self.records.get_mut(&id)
    }

    /// Number of non-blank records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TaskRecordProvider for TaskSheet {
    fn count(&self) -> u32 {
        self.count
    }

    fn record(&self, id: u32) -> Option<&TaskRecord> {
        self.records.get(&id)
    }

    fn records_between(&self, from: u32, to: u32) -> Vec<&TaskRecord> {
        let (from, to) = (from.max(1), to.min(self.count));
        if from > to {
            return Vec::new();
        }
        self.records.range(from..=to).map(|(_, r)| r).collect()
    }

    fn set_field(&mut self, id: u32, update: &FieldUpdate) -> RollupResult<()> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| RollupError::id_not_found(id))?;
        update.apply(record)
    }
}

/// Sheet handle shared between callers; each closure runs under one lock.
#[derive(Clone, Default)]
pub struct SharedSheet {
    sheet: Arc<Mutex<TaskSheet>>,
}

impl SharedSheet {
    pub fn new(sheet: TaskSheet) -> Self {
        Self {
            sheet: Arc::new(Mutex::new(sheet)),
        }
    }

    /// Execute a function with exclusive read access to the sheet.
    pub fn with_sheet<F, T>(&self, f: F) -> RollupResult<T>
    where
        F: FnOnce(&TaskSheet) -> RollupResult<T>,
    {
        let sheet = self
            .sheet
            .lock()
            .map_err(|e| RollupError::internal(format!("sheet lock poisoned: {}", e)))?;
        f(&sheet)
    }

    /// Execute a function with mutable access to the sheet.
    pub fn with_sheet_mut<F, T>(&self, f: F) -> RollupResult<T>
    where
        F: FnOnce(&mut TaskSheet) -> RollupResult<T>,
    {
        let mut sheet = self
            .sheet
            .lock()
            .map_err(|e| RollupError::internal(format!("sheet lock poisoned: {}", e)))?;
        f(&mut sheet)
    }
}
