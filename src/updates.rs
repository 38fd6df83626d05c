//! Write-back of status and date changes keyed by serial number.
//!
//! Updates go straight to the provider. The [`Aggregation`] used to locate the
//! lines is never refreshed; run [`crate::aggregate::aggregate`] again to see
//! the new values.

use crate::config::RollupConfig;
use crate::error::{RollupError, RollupResult};
use crate::provider::{FieldUpdate, TaskField, TaskRecordProvider};
use crate::types::{Aggregation, Timestamp};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::debug;

/// Apply `updates` to every line of the aggregated task `serial`.
///
/// Returns the number of lines written.
pub fn update_task<P: TaskRecordProvider + ?Sized>(
    provider: &mut P,
    aggregation: &Aggregation,
    serial: &str,
    updates: &[FieldUpdate],
) -> RollupResult<usize> {
    let task = aggregation
        .task(serial)
        .ok_or_else(|| RollupError::serial_not_found(serial))?;
    apply_all(provider, &task.source_ids, updates)
}

/// Apply `updates` to every line of the RFQA candidate `serial`.
pub fn update_rfqa<P: TaskRecordProvider + ?Sized>(
    provider: &mut P,
    aggregation: &Aggregation,
    serial: &str,
    updates: &[FieldUpdate],
) -> RollupResult<usize> {
    let rfqa = aggregation
        .rfqa(serial)
        .ok_or_else(|| RollupError::serial_not_found(serial))?;
    apply_all(provider, &rfqa.source_ids, updates)
}

/// Set percent complete on the lines of `serial` assigned exactly to `resource`.
///
/// Returns the number of lines written; zero means no line had that assignment.
pub fn update_progress_per_resource<P: TaskRecordProvider + ?Sized>(
    provider: &mut P,
    aggregation: &Aggregation,
    serial: &str,
    resource: &str,
    percent: u8,
) -> RollupResult<usize> {
    let task = aggregation
        .task(serial)
        .ok_or_else(|| RollupError::serial_not_found(serial))?;

    let targets: BTreeSet<u32> = task
        .source_ids
        .iter()
        .copied()
        .filter(|&id| {
            provider
                .record(id)
                .is_some_and(|r| r.resource_names == resource)
        })
        .collect();
    apply_all(provider, &targets, &[FieldUpdate::percent(percent)])
}

/// Move the finish of every line of the RFQA `serial` to `date` (midnight UTC).
///
/// The start is left alone unless `reset_start` is set.
pub fn update_rfqa_date<P: TaskRecordProvider + ?Sized>(
    provider: &mut P,
    aggregation: &Aggregation,
    serial: &str,
    date: NaiveDate,
    reset_start: bool,
) -> RollupResult<usize> {
    let instant = date_to_timestamp(date);
    let mut updates = vec![FieldUpdate::instant(TaskField::Finish, instant)];
    if reset_start {
        updates.push(FieldUpdate::instant(TaskField::Start, instant));
    }
    update_rfqa(provider, aggregation, serial, &updates)
}

/// [`update_rfqa_date`] for a textual date in `config.date_format`.
pub fn update_rfqa_date_text<P: TaskRecordProvider + ?Sized>(
    provider: &mut P,
    aggregation: &Aggregation,
    serial: &str,
    text: &str,
    reset_start: bool,
    config: &RollupConfig,
) -> RollupResult<usize> {
    let date = parse_date(text, &config.date_format)?;
    update_rfqa_date(provider, aggregation, serial, date, reset_start)
}

/// Parse a textual date with a chrono format such as `%Y/%m/%d`.
pub fn parse_date(text: &str, format: &str) -> RollupResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), format).map_err(|e| {
        RollupError::invalid_value("date", &format!("cannot parse '{}' as {}: {}", text, format, e))
    })
}

/// Midnight UTC of `date` as seconds since the epoch.
pub fn date_to_timestamp(date: NaiveDate) -> Timestamp {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn apply_all<P: TaskRecordProvider + ?Sized>(
    provider: &mut P,
    ids: &BTreeSet<u32>,
    updates: &[FieldUpdate],
) -> RollupResult<usize> {
    // Reject the whole batch before the first write
    for update in updates {
        update.validate()?;
    }
    if let Some(&missing) = ids.iter().find(|&&id| provider.record(id).is_none()) {
        return Err(RollupError::id_not_found(missing));
    }

    let mut touched = 0;
    for &id in ids {
        for update in updates {
            provider.set_field(id, update)?;
            debug!(id, field = update.field.as_str(), "updated line");
        }
        touched += 1;
    }
    Ok(touched)
}
