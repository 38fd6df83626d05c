//! Serial-number aggregation.
//!
//! A single pass over the schedule folds every line carrying a serial number
//! into one of three outcomes per (line, serial) pair: a contribution to an
//! [`AggregatedTask`], an [`RfqaCandidate`], or the unclassified residue.

use crate::config::RollupConfig;
use crate::error::{RollupError, RollupResult};
use crate::provider::TaskRecordProvider;
use crate::types::{
    AggregatedTask, Aggregation, RfqaCandidate, SerialIndex, TaskRecord, average_percent,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// How one serial number on one line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Task,
    Rfqa,
    Unclassified,
}

/// Classify a line for aggregation purposes.
///
/// Staffed lines with positive duration are tasks. Otherwise a line without
/// predecessors or children is an RFQA item.
pub fn classify(record: &TaskRecord) -> Classification {
    if record.has_resources() && record.duration() > 0 {
        Classification::Task
    } else if record.predecessor_count == 0 && record.child_count == 0 {
        Classification::Rfqa
    } else {
        Classification::Unclassified
    }
}

/// Scan every line of `provider` and build a fresh [`Aggregation`].
pub fn aggregate<P: TaskRecordProvider + ?Sized>(
    provider: &P,
    config: &RollupConfig,
) -> RollupResult<Aggregation> {
    let mut agg = Aggregation::default();
    let mut scanned = 0usize;

    for record in provider.records() {
        scanned += 1;
        if record.is_ignored(&config.ignore_marker) {
            if config.verbose {
                debug!(id = record.id, "ignored line");
            }
            continue;
        }
        if !record.has_serial() {
            continue;
        }

        let raw = record.serial_field.clone();
        let class = classify(record);
        let serials = record.serial_tokens();
        if serials.is_empty() {
            // Only separators, e.g. ","
            push_unique(&mut agg.unclassified, &raw, record.id);
        }
        for serial in serials {
            if config.verbose {
                debug!(id = record.id, serial, ?class, "classified line");
            }
            match class {
                Classification::Task => merge_task(&mut agg, serial, record),
                Classification::Rfqa => merge_rfqa(&mut agg, serial, record),
                Classification::Unclassified => push_unique(&mut agg.unclassified, &raw, record.id),
            }
        }

        if record.is_compound() {
            push_unique(&mut agg.compound, &raw, record.id);
        }
    }

    for task in agg.tasks.values_mut() {
        task.percent_work_complete = average_percent(&task.percent_samples).ok_or_else(|| {
            RollupError::internal(format!(
                "aggregated task {} has no percent-complete samples",
                task.serial
            ))
        })?;
    }

    info!(
        lines = scanned,
        tasks = agg.tasks.len(),
        rfqas = agg.rfqas.len(),
        compound = agg.compound.len(),
        unclassified = agg.unclassified.len(),
        "aggregated schedule"
    );
    Ok(agg)
}

fn merge_task(agg: &mut Aggregation, serial: &str, record: &TaskRecord) {
    match agg.tasks.get_mut(serial) {
        None => {
            agg.tasks.insert(
                serial.to_string(),
                AggregatedTask {
                    serial: serial.to_string(),
                    name: record.name.clone(),
                    priority: record.priority.clone(),
                    release_name: record.release_name.clone(),
                    qc_database: record.qc_database.clone(),
                    qc_release: record.qc_release.clone(),
                    resources: record.resource_tokens().into_iter().map(String::from).collect(),
                    source_ids: BTreeSet::from([record.id]),
                    outline_numbers: BTreeSet::from([record.outline_number.clone()]),
                    start: record.start,
                    finish: record.finish,
                    percent_samples: vec![record.percent_work_complete],
                    percent_work_complete: 0,
                },
            );
        }
        Some(task) => {
            task.resources
                .extend(record.resource_tokens().into_iter().map(String::from));
            task.start = task.start.min(record.start);
            task.finish = task.finish.max(record.finish);
            task.percent_samples.push(record.percent_work_complete);
            task.source_ids.insert(record.id);
            task.outline_numbers.insert(record.outline_number.clone());
        }
    }
}

fn merge_rfqa(agg: &mut Aggregation, serial: &str, record: &TaskRecord) {
    let rfqa = agg
        .rfqas
        .entry(serial.to_string())
        .or_insert_with(|| RfqaCandidate {
            serial: serial.to_string(),
            name: String::new(),
            start: 0,
            finish: 0,
            priority: String::new(),
            release_name: String::new(),
            qc_database: String::new(),
            qc_release: String::new(),
            source_ids: BTreeSet::new(),
        });
    // Lower lines in the schedule overwrite earlier ones
    rfqa.name = record.name.clone();
    rfqa.start = record.start;
    rfqa.finish = record.finish;
    rfqa.priority = record.priority.clone();
    rfqa.release_name = record.release_name.clone();
    rfqa.qc_database = record.qc_database.clone();
    rfqa.qc_release = record.qc_release.clone();
    rfqa.source_ids.insert(record.id);
}

fn push_unique(index: &mut SerialIndex, raw: &str, id: u32) {
    let ids = index.entry(raw.to_string()).or_default();
    if !ids.contains(&id) {
        ids.push(id);
    }
}
