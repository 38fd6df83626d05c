//! Output formatting utilities for markdown and JSON.

use crate::error::{RollupError, RollupResult};
use crate::provider::TaskRecordProvider;
use crate::types::{AnalysisTree, Aggregation, CategoryRollups, Timestamp};
use chrono::DateTime;
use serde_json::json;

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Render a timestamp as `YYYY-MM-DD HH:MM` UTC.
pub fn format_instant(t: Timestamp) -> String {
    DateTime::from_timestamp(t, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| t.to_string())
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format an aggregation as markdown.
pub fn format_aggregation_markdown(agg: &Aggregation) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Tasks ({})\n\n", agg.tasks.len()));
    for task in agg.tasks.values() {
        md.push_str(&format!("## {}: {}\n", task.serial, task.name));
        md.push_str(&format!(
            "- **window**: {} -> {}\n",
            format_instant(task.start),
            format_instant(task.finish)
        ));
        md.push_str(&format!("- **complete**: {}%\n", task.percent_work_complete));
        if !task.resources.is_empty() {
            md.push_str(&format!("- **resources**: {}\n", join(&task.resources)));
        }
        if !task.priority.is_empty() {
            md.push_str(&format!("- **priority**: {}\n", task.priority));
        }
        if !task.release_name.is_empty() {
            md.push_str(&format!("- **release**: {}\n", task.release_name));
        }
        md.push_str(&format!("- **lines**: {}\n\n", join(&task.source_ids)));
    }

    if !agg.rfqas.is_empty() {
        md.push_str(&format!("# RFQA ({})\n\n", agg.rfqas.len()));
        for rfqa in agg.rfqas.values() {
            md.push_str(&format!(
                "- **{}** {} due {} (lines {})\n",
                rfqa.serial,
                rfqa.name,
                format_instant(rfqa.finish),
                join(&rfqa.source_ids)
            ));
        }
        md.push('\n');
    }

    for (title, index) in [("Compound lines", &agg.compound), ("Unclassified", &agg.unclassified)] {
        if index.is_empty() {
            continue;
        }
        md.push_str(&format!("# {} ({})\n\n", title, index.len()));
        for (raw, ids) in index {
            md.push_str(&format!("- `{}`: {}\n", raw, join(ids)));
        }
        md.push('\n');
    }

    md
}

/// Format an analysis tree and its category rollups as markdown.
pub fn format_analysis_markdown(tree: &AnalysisTree, categories: &CategoryRollups) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Analysis ({})\n\n", tree.len()));
    for entry in tree.iter() {
        md.push_str(&format!("## {}\n", entry.key));
        if !entry.category.is_empty() {
            md.push_str(&format!("- **category**: {}\n", entry.category));
        }
        md.push_str(&format!(
            "- **window**: {} -> {}\n",
            format_instant(entry.start),
            format_instant(entry.finish)
        ));
        md.push_str(&format!(
            "- **work**: {} of {}\n",
            entry.actual_work, entry.total_work
        ));
        if let Some(pct) = entry.average_percent() {
            md.push_str(&format!("- **complete**: {}%\n", pct));
        }
        md.push_str(&format!("- **leaves**: {}\n\n", entry.sub_tasks.len()));
    }

    md.push_str(&format!("# Categories ({})\n\n", categories.len()));
    for (name, rollup) in categories {
        let label = if name.is_empty() { "(none)" } else { name.as_str() };
        md.push_str(&format!(
            "- **{}**: {} items, work {} of {}",
            label,
            rollup.members.len(),
            rollup.actual_work,
            rollup.total_work
        ));
        if let Some(pct) = rollup.average_percent() {
            md.push_str(&format!(", {}%", pct));
        }
        md.push('\n');
    }

    md
}

/// List every line of a schedule, one per row.
pub fn format_sheet_markdown<P: TaskRecordProvider + ?Sized>(provider: &P) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Schedule ({} lines)\n\n", provider.count()));
    md.push_str("| id | name | serial | resources | start | finish | % |\n");
    md.push_str("|----|------|--------|-----------|-------|--------|---|\n");
    for id in 1..=provider.count() {
        match provider.record(id) {
            Some(r) => {
                let name: String = r.name.chars().take(60).collect();
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} | {} |\n",
                    r.id,
                    name,
                    r.serial_field,
                    r.resource_names,
                    format_instant(r.start),
                    format_instant(r.finish),
                    r.percent_work_complete
                ));
            }
            None => md.push_str(&format!("| {} | *empty* | | | | | |\n", id)),
        }
    }
    md
}

/// Render an aggregation in the requested format.
pub fn render_aggregation(agg: &Aggregation, format: OutputFormat) -> RollupResult<String> {
    match format {
        OutputFormat::Markdown => Ok(format_aggregation_markdown(agg)),
        OutputFormat::Json => serde_json::to_string_pretty(agg).map_err(RollupError::internal),
    }
}

/// Render an analysis tree in the requested format.
pub fn render_analysis(
    tree: &AnalysisTree,
    categories: &CategoryRollups,
    format: OutputFormat,
) -> RollupResult<String> {
    match format {
        OutputFormat::Markdown => Ok(format_analysis_markdown(tree, categories)),
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "tree": tree,
            "categories": categories,
        }))
        .map_err(RollupError::internal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TaskSheet;
    use crate::types::TaskRecord;

    #[test]
    fn output_format_parses_aliases() {
        assert_eq!(OutputFormat::from_str("MD"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn instant_formats_utc() {
        assert_eq!(format_instant(0), "1970-01-01 00:00");
    }

    #[test]
    fn sheet_marks_blank_lines() {
        let mut r = TaskRecord::new(2);
        r.name = "Build".to_string();
        let sheet = TaskSheet::from_records(vec![r]);
        let md = format_sheet_markdown(&sheet);
        assert!(md.contains("| 1 | *empty* |"));
        assert!(md.contains("| 2 | Build |"));
    }

    #[test]
    fn empty_aggregation_renders_header_only() {
        let md = format_aggregation_markdown(&Aggregation::default());
        assert_eq!(md, "# Tasks (0)\n\n");
    }
}
