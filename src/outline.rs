//! Outline-number ranges.
//!
//! Outline numbers are dot-separated positions (`"3.2.1"`). Descendants of a
//! line always follow it contiguously, so a subtree is a range of ids that
//! ends at the first line outside the parent's prefix.

use crate::error::{RollupError, RollupResult};
use crate::provider::TaskRecordProvider;
use crate::types::{OutlineRange, TaskRecord};
use tracing::debug;

/// Number of components in an outline number; empty is level 0.
pub fn outline_level(outline: &str) -> usize {
    if outline.is_empty() {
        0
    } else {
        outline.split('.').count()
    }
}

/// True when `descendant` sits strictly below `ancestor` in the outline.
pub fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    descendant
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('.'))
}

/// Range of the subtree under the first line, from `search_from` on, whose
/// name or serial column equals `key`.
///
/// Returns `(parent + 1, last descendant)`, or `(parent, parent)` when the
/// line has no descendants. Fails with `TaskNotFound` when no line matches.
pub fn find_range<P: TaskRecordProvider + ?Sized>(
    provider: &P,
    key: &str,
    search_from: u32,
) -> RollupResult<OutlineRange> {
    let parent = find_anchor(provider, key, search_from)?;
    Ok(subtree_of(provider, parent))
}

/// First line, from `search_from` on, whose name or serial column equals `key`.
pub fn find_anchor<'a, P: TaskRecordProvider + ?Sized>(
    provider: &'a P,
    key: &str,
    search_from: u32,
) -> RollupResult<&'a TaskRecord> {
    provider
        .records_between(search_from, provider.count())
        .into_iter()
        .find(|r| r.name == key || r.serial_field == key)
        .ok_or_else(|| RollupError::task_not_found(key))
}

/// Range of the subtree under the line at `task_id`.
pub fn find_sub_range<P: TaskRecordProvider + ?Sized>(
    provider: &P,
    task_id: u32,
) -> RollupResult<OutlineRange> {
    let parent = provider
        .record(task_id)
        .ok_or_else(|| RollupError::id_not_found(task_id))?;
    Ok(subtree_of(provider, parent))
}

fn subtree_of<P: TaskRecordProvider + ?Sized>(provider: &P, parent: &TaskRecord) -> OutlineRange {
    let Some(first) = parent.id.checked_add(1) else {
        return OutlineRange::new(parent.id, parent.id);
    };
    let mut last = parent.id;

    for record in provider.records_between(first, provider.count()) {
        if is_ancestor(&parent.outline_number, &record.outline_number) {
            last = record.id;
        } else {
            break;
        }
    }

    let range = if last < first {
        OutlineRange::new(parent.id, parent.id)
    } else {
        OutlineRange::new(first, last)
    };
    debug!(parent = parent.id, start = range.start, end = range.end, "resolved outline range");
    range
}
