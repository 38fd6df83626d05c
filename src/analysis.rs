//! Analysis tree rollups.
//!
//! Under a root line, every line whose serial starts with the analysis prefix
//! opens an [`AnalysisEntry`]. The leaves in that entry's subtree are summed
//! into the entry and into a per-category [`CategoryRollup`], keyed by the
//! line's category column. Leaves with children of their own are skipped here;
//! their leaves are folded when the deeper entry is processed.

use crate::config::{AnalysisWindow, RollupConfig};
use crate::error::RollupResult;
use crate::outline::{find_anchor, find_range, find_sub_range};
use crate::provider::TaskRecordProvider;
use crate::types::{
    AnalysisEntry, AnalysisTree, CategoryLeaf, CategoryRollup, CategoryRollups, LeafContribution,
    OutlineRange, TaskRecord, Timestamp,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// First id scanned for analysis entries below the root at `root_id` whose range is `range`.
pub fn scan_start(root_id: u32, range: OutlineRange, window: AnalysisWindow) -> u32 {
    match window {
        AnalysisWindow::Legacy => range.start.saturating_sub(1).max(1),
        AnalysisWindow::RootAnchored => root_id,
    }
}

/// Key under which a leaf line is stored: serial, resources without commas, id.
pub fn leaf_key(record: &TaskRecord) -> String {
    format!(
        "{}_{}_{}",
        record.serial_field,
        record.resource_names.replace(',', ""),
        record.id
    )
}

/// Build the analysis tree and category rollups under the line named or serialled `root_key`.
///
/// Fails with `TaskNotFound` when no line matches `root_key`.
pub fn build_analysis_tree<P: TaskRecordProvider + ?Sized>(
    provider: &P,
    root_key: &str,
    config: &RollupConfig,
) -> RollupResult<(AnalysisTree, CategoryRollups)> {
    let root = find_anchor(provider, root_key, 1)?;
    let range = find_sub_range(provider, root.id)?;
    let first = scan_start(root.id, range, config.analysis_window);

    let mut tree = AnalysisTree::new();
    let mut categories: CategoryRollups = BTreeMap::new();

    for record in provider.records_between(first, range.end) {
        if record.is_ignored(&config.ignore_marker) || !config.is_analysis_serial(&record.serial_field) {
            continue;
        }

        let key = record.serial_field.clone();
        let category = record.ignore_flag.clone();
        let mut entry = AnalysisEntry {
            key: key.clone(),
            start: record.start,
            finish: record.finish,
            category: category.clone(),
            subrange: find_range(provider, &key, record.id)?,
            total_work: 0.0,
            actual_work: 0.0,
            percent_samples: Vec::new(),
            sub_tasks: BTreeMap::new(),
        };

        let rollup = categories
            .entry(category.clone())
            .or_insert_with(|| CategoryRollup {
                category: category.clone(),
                members: Vec::new(),
                start: record.start,
                finish: record.finish,
                total_work: 0.0,
                actual_work: 0.0,
                percent_samples: Vec::new(),
                sub_tasks: BTreeMap::new(),
            });
        rollup.members.push(key.clone());
        rollup.start = rollup.start.min(record.start);
        rollup.finish = rollup.finish.max(record.finish);

        for line in provider.records_between(entry.subrange.start, entry.subrange.end) {
            if line.is_ignored(&config.ignore_marker) || !(line.has_serial() || line.has_resources()) {
                continue;
            }
            if !find_sub_range(provider, line.id)?.is_leaf_of(line.id) {
                continue;
            }

            let leaf = LeafContribution {
                start: line.start,
                finish: line.finish,
                work: line.work,
                actual_work: line.actual_work,
                percent_work_complete: line.percent_work_complete,
            };
            let leaf_id = leaf_key(line);
            if config.verbose {
                debug!(analysis = %key, leaf = %leaf_id, "folded leaf");
            }

            fold(&mut entry.start, &mut entry.finish, &leaf);
            entry.total_work += leaf.work;
            entry.actual_work += leaf.actual_work;
            entry.percent_samples.push(leaf.percent_work_complete);

            fold(&mut rollup.start, &mut rollup.finish, &leaf);
            rollup.total_work += leaf.work;
            rollup.actual_work += leaf.actual_work;
            rollup.percent_samples.push(leaf.percent_work_complete);

            rollup.sub_tasks.insert(
                leaf_id.clone(),
                CategoryLeaf {
                    leaf: leaf.clone(),
                    analysis_key: key.clone(),
                },
            );
            entry.sub_tasks.insert(leaf_id, leaf);
        }

        tree.insert(entry);
    }

    info!(
        root = root_key,
        entries = tree.len(),
        categories = categories.len(),
        "built analysis tree"
    );
    Ok((tree, categories))
}

fn fold(start: &mut Timestamp, finish: &mut Timestamp, leaf: &LeafContribution) {
    *start = (*start).min(leaf.start);
    *finish = (*finish).max(leaf.finish);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_start_per_window() {
        // Root 4 with children 5..=9
        let subtree = OutlineRange::new(5, 9);
        assert_eq!(scan_start(4, subtree, AnalysisWindow::Legacy), 4);
        assert_eq!(scan_start(4, subtree, AnalysisWindow::RootAnchored), 4);
        // Childless root 5
        let leaf = OutlineRange::new(5, 5);
        assert_eq!(scan_start(5, leaf, AnalysisWindow::Legacy), 4);
        assert_eq!(scan_start(5, leaf, AnalysisWindow::RootAnchored), 5);
        assert_eq!(scan_start(1, OutlineRange::new(1, 1), AnalysisWindow::Legacy), 1);
    }

    #[test]
    fn leaf_key_strips_resource_commas() {
        let mut record = TaskRecord::new(12);
        record.serial_field = "AN-3".to_string();
        record.resource_names = "bob,carl".to_string();
        assert_eq!(leaf_key(&record), "AN-3_bobcarl_12");
    }
}
