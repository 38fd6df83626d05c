//! Expected-progress helpers for schedule tracking.

use crate::config::RollupConfig;
use crate::types::{TaskRecord, Timestamp};
use chrono::DateTime;
use serde::Serialize;

/// Percent complete a line should show at `at`, assuming linear progress.
pub fn expected_progress(start: Timestamp, finish: Timestamp, at: Timestamp) -> u8 {
    if at <= start {
        0
    } else if at > finish {
        100
    } else {
        // start < at <= finish, so finish - start > 0
        ((at - start) * 100 / (finish - start)) as u8
    }
}

/// Work that should be done by `at` out of `total`, assuming linear progress.
pub fn expected_work(total: f64, start: Timestamp, finish: Timestamp, at: Timestamp) -> f64 {
    if at <= start {
        0.0
    } else if at > finish {
        total
    } else {
        total * (at - start) as f64 / (finish - start) as f64
    }
}

/// Expected minus actual percent complete at `at`; positive means behind schedule.
pub fn progress_gap(record: &TaskRecord, at: Timestamp) -> i16 {
    i16::from(expected_progress(record.start, record.finish, at))
        - i16::from(record.percent_work_complete)
}

/// Due date and status of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineInfo {
    /// Deadline if set, otherwise finish, rendered with the configured date format.
    pub due: String,
    pub percent_work_complete: u8,
    pub outline_level: usize,
}

/// Due date of `record`, rendered with `config.date_format`.
pub fn deadline_info(record: &TaskRecord, config: &RollupConfig) -> DeadlineInfo {
    let due_at = record.deadline.unwrap_or(record.finish);
    let due = DateTime::from_timestamp(due_at, 0)
        .map(|dt| dt.format(&config.date_format).to_string())
        .unwrap_or_else(|| due_at.to_string());
    DeadlineInfo {
        due,
        percent_work_complete: record.percent_work_complete,
        outline_level: record.outline_level(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_and_linear() {
        assert_eq!(expected_progress(100, 200, 50), 0);
        assert_eq!(expected_progress(100, 200, 100), 0);
        assert_eq!(expected_progress(100, 200, 150), 50);
        assert_eq!(expected_progress(100, 200, 200), 100);
        assert_eq!(expected_progress(100, 200, 201), 100);
        assert_eq!(expected_progress(0, 3, 1), 33);
    }

    #[test]
    fn work_is_linear_share() {
        assert_eq!(expected_work(40.0, 0, 10, 0), 0.0);
        assert_eq!(expected_work(40.0, 0, 10, 5), 20.0);
        assert_eq!(expected_work(40.0, 0, 10, 11), 40.0);
    }

    #[test]
    fn gap_is_signed() {
        let mut record = TaskRecord::new(1);
        record.start = 0;
        record.finish = 100;
        record.percent_work_complete = 80;
        assert_eq!(progress_gap(&record, 50), -30);
    }

    #[test]
    fn deadline_falls_back_to_finish() {
        let mut record = TaskRecord::new(1);
        record.finish = 86_400;
        record.outline_number = "2.1".to_string();
        let info = deadline_info(&record, &RollupConfig::default());
        assert_eq!(info.due, "1970/01/02");
        assert_eq!(info.outline_level, 2);

        record.deadline = Some(0);
        assert_eq!(deadline_info(&record, &RollupConfig::default()).due, "1970/01/01");
    }

    #[test]
    fn deadline_uses_configured_format() {
        let mut record = TaskRecord::new(1);
        record.deadline = Some(86_400);
        let config = RollupConfig {
            date_format: "%d.%m.%Y".to_string(),
            ..RollupConfig::default()
        };
        assert_eq!(deadline_info(&record, &config).due, "02.01.1970");
    }
}
