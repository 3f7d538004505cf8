use crate::errors::DashboardError;
use crate::types::{RankedTable, TopSelection};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), DashboardError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DashboardError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Markdown table of at most `max_rows` rows, or a `(no rows)` marker.
pub fn table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn render_top(title: &str, selection: &TopSelection) -> String {
    format!(
        "{}\n\n{}\n\n{}\n",
        title,
        selection.heading(),
        table_rows(&selection.rows, selection.rows.len())
    )
}

pub fn render_ranked(table: &RankedTable) -> String {
    format!(
        "Calculate companies overall ranks\n(weights: {})\n\n{}\n",
        table.weights,
        table_rows(&table.rows, table.rows.len())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metric, TopRow};

    #[test]
    fn empty_selection_renders_marker() {
        let sel = TopSelection {
            metric: Metric::Roce,
            rows: Vec::new(),
        };
        let out = render_top("Branded companies", &sel);
        assert!(out.contains("Top 0 Current ROCE"));
        assert!(out.contains("(no rows)"));
    }

    #[test]
    fn top_rows_render_as_markdown() {
        let sel = TopSelection {
            metric: Metric::OperatingMargin,
            rows: vec![TopRow {
                position: 1,
                company: "Acme".to_string(),
                value: Some(1234.5),
                bar: "██".to_string(),
            }],
        };
        let out = render_top("Own Branded companies", &sel);
        assert!(out.contains("| Acme"));
        assert!(out.contains("1,234.50"));
    }
}
