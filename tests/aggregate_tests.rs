//! Integration tests for serial-number aggregation.

use project_rollup::aggregate::aggregate;
use project_rollup::config::RollupConfig;
use project_rollup::provider::{TaskRecordProvider, TaskSheet};
use project_rollup::types::TaskRecord;

/// Helper to build a staffed or unstaffed line.
fn line(id: u32, serial: &str, resources: &str, start: i64, finish: i64, pct: u8) -> TaskRecord {
    let mut r = TaskRecord::new(id);
    r.name = format!("Line {}", id);
    r.serial_field = serial.to_string();
    r.resource_names = resources.to_string();
    r.start = start;
    r.finish = finish;
    r.percent_work_complete = pct;
    r.outline_number = format!("1.{}", id);
    r
}

fn config() -> RollupConfig {
    RollupConfig::default()
}

mod task_tests {
    use super::*;

    #[test]
    fn duplicate_serials_merge_into_one_task() {
        let sheet = TaskSheet::from_records(vec![
            line(1, "A", "bob", 10, 20, 40),
            line(2, "A", "carl", 5, 25, 60),
        ]);

        let agg = aggregate(&sheet, &config()).unwrap();
        assert_eq!(agg.tasks.len(), 1);

        let task = agg.task("A").unwrap();
        assert_eq!(task.start, 5);
        assert_eq!(task.finish, 25);
        assert_eq!(
            task.resources.iter().cloned().collect::<Vec<_>>(),
            vec!["bob".to_string(), "carl".to_string()]
        );
        assert_eq!(task.percent_work_complete, 50);
        assert_eq!(task.source_ids.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn first_seen_line_names_the_task() {
        let mut first = line(1, "A", "bob", 0, 10, 0);
        first.priority = "P1".to_string();
        first.release_name = "R1".to_string();
        let mut second = line(2, "A", "bob", 0, 10, 0);
        second.name = "Renamed".to_string();
        second.priority = "P3".to_string();

        let agg = aggregate(&TaskSheet::from_records(vec![first, second]), &config()).unwrap();
        let task = agg.task("A").unwrap();
        assert_eq!(task.name, "Line 1");
        assert_eq!(task.priority, "P1");
        assert_eq!(task.release_name, "R1");
    }

    #[test]
    fn percent_average_truncates() {
        let sheet = TaskSheet::from_records(vec![
            line(1, "A", "bob", 0, 10, 10),
            line(2, "A", "bob", 0, 10, 15),
        ]);
        let agg = aggregate(&sheet, &config()).unwrap();
        assert_eq!(agg.task("A").unwrap().percent_work_complete, 12);
    }

    #[test]
    fn zero_duration_staffed_line_is_not_a_task() {
        let sheet = TaskSheet::from_records(vec![line(1, "M", "bob", 10, 10, 0)]);
        let agg = aggregate(&sheet, &config()).unwrap();
        assert!(agg.task("M").is_none());
        // No predecessors or children, so it is still an RFQA item
        assert!(agg.rfqa("M").is_some());
    }
}

mod rfqa_tests {
    use super::*;

    #[test]
    fn unstaffed_leaf_without_predecessors_is_rfqa() {
        let sheet = TaskSheet::from_records(vec![line(1, "Q1", "", 0, 0, 0)]);
        let agg = aggregate(&sheet, &config()).unwrap();

        assert_eq!(agg.rfqas.len(), 1);
        assert!(agg.rfqa("Q1").is_some());
        assert!(agg.tasks.is_empty());
        assert!(agg.unclassified.is_empty());
    }

    #[test]
    fn later_line_overwrites_scalars_and_ids_accumulate() {
        let mut early = line(3, "Q", "", 100, 100, 0);
        early.priority = "low".to_string();
        let mut late = line(8, "Q", "", 200, 250, 0);
        late.priority = "high".to_string();
        late.release_name = "R2".to_string();

        let agg = aggregate(&TaskSheet::from_records(vec![early, late]), &config()).unwrap();
        let rfqa = agg.rfqa("Q").unwrap();
        assert_eq!(rfqa.name, "Line 8");
        assert_eq!(rfqa.start, 200);
        assert_eq!(rfqa.finish, 250);
        assert_eq!(rfqa.priority, "high");
        assert_eq!(rfqa.release_name, "R2");
        assert_eq!(rfqa.source_ids.iter().copied().collect::<Vec<_>>(), vec![3, 8]);
    }

    #[test]
    fn summary_line_without_resources_is_unclassified() {
        let mut summary = line(2, "S", "", 0, 10, 0);
        summary.child_count = 3;
        let mut linked = line(5, "L", "", 0, 10, 0);
        linked.predecessor_count = 1;

        let agg = aggregate(&TaskSheet::from_records(vec![summary, linked]), &config()).unwrap();
        assert!(agg.rfqas.is_empty());
        assert_eq!(agg.unclassified.get("S"), Some(&vec![2]));
        assert_eq!(agg.unclassified.get("L"), Some(&vec![5]));
    }
}

mod compound_tests {
    use super::*;

    #[test]
    fn compound_line_indexed_and_each_serial_classified() {
        let sheet = TaskSheet::from_records(vec![
            line(1, "A,B", "bob", 0, 10, 20),
            line(2, "B", "carl", 5, 30, 80),
        ]);

        let agg = aggregate(&sheet, &config()).unwrap();
        assert_eq!(agg.compound_ids("A,B"), Some(&[1][..]));
        assert_eq!(agg.task("A").unwrap().source_ids.len(), 1);

        let b = agg.task("B").unwrap();
        assert_eq!(b.source_ids.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(b.percent_work_complete, 50);
    }

    #[test]
    fn compound_unstaffed_line_yields_two_rfqas() {
        let sheet = TaskSheet::from_records(vec![line(4, "Q1,Q2", "", 0, 0, 0)]);
        let agg = aggregate(&sheet, &config()).unwrap();
        assert!(agg.rfqa("Q1").is_some());
        assert!(agg.rfqa("Q2").is_some());
        assert_eq!(agg.compound_ids("Q1,Q2"), Some(&[4][..]));
    }

    #[test]
    fn same_raw_field_on_several_lines_collects_ids() {
        let sheet = TaskSheet::from_records(vec![
            line(1, "A,B", "bob", 0, 10, 0),
            line(6, "A,B", "dana", 0, 10, 0),
        ]);
        let agg = aggregate(&sheet, &config()).unwrap();
        assert_eq!(agg.compound_ids("A,B"), Some(&[1, 6][..]));
    }
}

mod invariant_tests {
    use super::*;

    fn mixed_sheet() -> TaskSheet {
        let mut summary = line(4, "S", "", 0, 10, 0);
        summary.child_count = 1;
        let mut ignored = line(6, "I", "bob", 0, 10, 0);
        ignored.ignore_flag = "IGNORE".to_string();
        let mut linked = line(7, "T,U", "", 0, 10, 0);
        linked.predecessor_count = 2;
        TaskSheet::from_records(vec![
            line(1, "A", "bob", 0, 10, 30),
            line(2, "A,Q", "", 0, 0, 0),
            line(3, "", "bob", 0, 10, 0),
            summary,
            line(5, ",", "bob", 0, 10, 0),
            ignored,
            linked,
            line(9, "B", "carl,dana", 3, 9, 70),
        ])
    }

    #[test]
    fn every_serial_line_is_accounted_for() {
        let sheet = mixed_sheet();
        let config = config();
        let agg = aggregate(&sheet, &config).unwrap();

        for record in sheet.records() {
            if record.is_ignored(&config.ignore_marker) || !record.has_serial() {
                assert!(!agg.accounts_for(record.id), "line {} should be skipped", record.id);
            } else {
                assert!(agg.accounts_for(record.id), "line {} not accounted for", record.id);
            }
        }
    }

    #[test]
    fn aggregation_is_idempotent() {
        let sheet = mixed_sheet();
        let first = aggregate(&sheet, &config()).unwrap();
        let second = aggregate(&sheet, &config()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn verbose_scan_gives_same_result() {
        let sheet = mixed_sheet();
        let quiet = aggregate(&sheet, &config()).unwrap();
        let loud = aggregate(&sheet, &config().with_verbose(true)).unwrap();
        assert_eq!(quiet, loud);
    }

    #[test]
    fn empty_sheet_aggregates_to_nothing() {
        let agg = aggregate(&TaskSheet::new(), &config()).unwrap();
        assert!(agg.tasks.is_empty());
        assert!(agg.rfqas.is_empty());
    }
}
