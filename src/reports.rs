use crate::loader::Dataset;
use crate::types::{CompanyRecord, Metric, Segment, TopRow, TopSelection};
use chrono::NaiveDate;
use std::cmp::Ordering;
use tracing::debug;

pub const DEFAULT_TOP_N: usize = 10;
const BAR_WIDTH: usize = 30;

/// Rows belonging to one segment, in dataset order.
pub fn filter_segment(data: &Dataset, segment: Segment) -> Vec<&CompanyRecord> {
    let rows: Vec<&CompanyRecord> = data
        .records()
        .iter()
        .filter(|r| r.activity == segment.code())
        .collect();
    debug!(segment = segment.code(), rows = rows.len(), "segment filtered");
    rows
}

/// Top-N selector default, bounded by what is available.
pub fn default_top_n(len: usize) -> usize {
    DEFAULT_TOP_N.min(len)
}

/// The `top_n` rows with the largest `metric`. Ties keep input order and
/// rows without a value come after every row with one.
pub fn select_top(rows: &[&CompanyRecord], metric: Metric, top_n: usize) -> TopSelection {
    let mut sorted: Vec<(Option<f64>, &CompanyRecord)> =
        rows.iter().map(|r| (metric.value(r), *r)).collect();
    sorted.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted.truncate(top_n);

    let scale = sorted
        .iter()
        .filter_map(|(v, _)| *v)
        .fold(0.0_f64, |acc, v| acc.max(v));

    let rows = sorted
        .into_iter()
        .enumerate()
        .map(|(idx, (value, r))| TopRow {
            position: idx + 1,
            company: r.name.clone(),
            value,
            bar: bar_for(value, scale),
        })
        .collect();
    TopSelection { metric, rows }
}

fn bar_for(value: Option<f64>, scale: f64) -> String {
    match value {
        Some(v) if v > 0.0 && scale > 0.0 => {
            let len = ((v / scale) * BAR_WIDTH as f64).round().max(1.0) as usize;
            "█".repeat(len)
        }
        _ => String::new(),
    }
}

/// Rows whose year-end falls within `start..=end`. Undated rows never match.
pub fn filter_by_year_end<'a, I>(rows: I, start: NaiveDate, end: NaiveDate) -> Vec<&'a CompanyRecord>
where
    I: IntoIterator<Item = &'a CompanyRecord>,
{
    let kept: Vec<&CompanyRecord> = rows
        .into_iter()
        .filter(|r| r.year_end.is_some_and(|d| start <= d && d <= end))
        .collect();
    debug!(%start, %end, rows = kept.len(), "year-end range filtered");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(name: &str, activity: &str, year_end: Option<NaiveDate>, at: Option<f64>) -> CompanyRecord {
        CompanyRecord {
            name: name.to_string(),
            activity: activity.to_string(),
            year_end,
            at_current: at,
            op_current: None,
            om_current: None,
            roce_current_pct: None,
            at_yoy: None,
            op_yoy: None,
            roce_current: None,
        }
    }

    fn ym(y: i32, m: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, 1)
    }

    #[test]
    fn segment_filter_keeps_matching_rows_in_order() {
        let data = Dataset::new(vec![
            record("one", "B", None, None),
            record("two", "O/L", None, None),
            record("three", "B", None, None),
            record("four", "X", None, None),
        ]);
        let names: Vec<&str> = filter_segment(&data, Segment::Branded)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["one", "three"]);
        let own: Vec<&str> = filter_segment(&data, Segment::OwnBranded)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(own, vec!["two"]);
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn top_selection_is_descending_with_missing_last() {
        let recs = [
            record("low", "B", None, Some(1.0)),
            record("none", "B", None, None),
            record("high", "B", None, Some(9.0)),
            record("tie_a", "B", None, Some(5.0)),
            record("tie_b", "B", None, Some(5.0)),
        ];
        let rows: Vec<&CompanyRecord> = recs.iter().collect();
        let sel = select_top(&rows, Metric::AnnualizedTurnover, 5);
        let names: Vec<&str> = sel.rows.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(names, vec!["high", "tie_a", "tie_b", "low", "none"]);
        assert_eq!(sel.rows[0].bar.chars().count(), BAR_WIDTH);
        assert!(sel.rows[4].bar.is_empty());

        let top2 = select_top(&rows, Metric::AnnualizedTurnover, 2);
        assert_eq!(top2.heading(), "Top 2 Current annualized turnover");
    }

    #[test]
    fn top_n_beyond_row_count_returns_everything() {
        let recs = [record("only", "B", None, Some(3.0))];
        let rows: Vec<&CompanyRecord> = recs.iter().collect();
        assert_eq!(select_top(&rows, Metric::AnnualizedTurnover, 10).rows.len(), 1);
        assert_eq!(default_top_n(3), 3);
        assert_eq!(default_top_n(150), 10);
    }

    #[test]
    fn year_end_range_is_inclusive_and_skips_undated() {
        let recs = [
            record("before", "B", ym(2020, 12), None),
            record("start", "B", ym(2021, 3), None),
            record("middle", "B", ym(2022, 6), None),
            record("end", "B", ym(2023, 3), None),
            record("after", "B", ym(2023, 4), None),
            record("undated", "B", None, None),
        ];
        let kept = filter_by_year_end(&recs, ym(2021, 3).unwrap(), ym(2023, 3).unwrap());
        let names: Vec<&str> = kept.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["start", "middle", "end"]);
    }
}
