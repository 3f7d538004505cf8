use crate::errors::DashboardError;
use crate::types::{CompanyRecord, RawRow};
use crate::util::{parse_f64_safe, parse_year_end};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
    pub undated_rows: usize,
    pub coerced_cells: usize,
    pub encoding: &'static str,
}

/// The company table, loaded once and only ever read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CompanyRecord>,
}

impl Dataset {
    pub fn new(records: Vec<CompanyRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CompanyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest parseable year-end. Rows without a date are
    /// ignored rather than treated as the lower bound.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(|r| r.year_end);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Resolve optional `Mon-YY` bounds against the observed year-ends.
    /// A missing bound falls back to the earliest or latest date.
    pub fn range(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<(NaiveDate, NaiveDate), DashboardError> {
        let (lo, hi) = self.date_bounds().ok_or(DashboardError::NoDatedRows)?;
        let start = from.map(parse_bound).transpose()?.unwrap_or(lo);
        let end = to.map(parse_bound).transpose()?.unwrap_or(hi);
        if start > end {
            return Err(DashboardError::InvalidRange { start, end });
        }
        Ok((start, end))
    }
}

pub fn parse_bound(raw: &str) -> Result<NaiveDate, DashboardError> {
    parse_year_end(Some(raw)).ok_or_else(|| DashboardError::InvalidYearEnd(raw.to_string()))
}

pub fn load_dataset(path: &Path) -> Result<(Dataset, LoadReport), DashboardError> {
    let bytes = std::fs::read(path).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "loading dataset");
    parse_dataset(&bytes)
}

/// Decode raw bytes, falling back to Windows-1252 when the input is not
/// valid UTF-8. Never fails.
pub fn decode_best_effort(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match UTF_8.decode_without_bom_handling_and_without_replacement(body) {
        Some(text) => (text, UTF_8),
        None => {
            let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(body);
            warn!(had_errors, "input is not valid UTF-8, decoded as windows-1252");
            (text, WINDOWS_1252)
        }
    }
}

pub fn parse_dataset(bytes: &[u8]) -> Result<(Dataset, LoadReport), DashboardError> {
    let (text, encoding) = decode_best_effort(bytes);
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut report = LoadReport {
        encoding: encoding.name(),
        ..LoadReport::default()
    };
    let mut records: Vec<CompanyRecord> = Vec::new();

    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = idx + 1, error = %e, "skipping unreadable row");
                report.parse_errors += 1;
                continue;
            }
        };

        let mut coerce = |raw: Option<&str>| {
            let v = parse_f64_safe(raw);
            if v.is_none() && raw.is_some_and(|s| !s.trim().is_empty()) {
                report.coerced_cells += 1;
            }
            v
        };
        let at_current = coerce(row.at_current.as_deref());
        let op_current = coerce(row.op_current.as_deref());
        let om_current = coerce(row.om_current.as_deref());
        let roce_current_pct = coerce(row.roce_current_pct.as_deref());
        let at_yoy = coerce(row.at_yoy.as_deref());
        let op_yoy = coerce(row.op_yoy.as_deref());
        let roce_current = coerce(row.roce_current.as_deref());

        let year_end = parse_year_end(row.year_end.as_deref());
        if year_end.is_none() {
            debug!(row = idx + 1, raw = ?row.year_end, "unparseable year_end");
            report.undated_rows += 1;
        }

        records.push(CompanyRecord {
            name: row.comp_name.unwrap_or_default(),
            activity: row.activity.unwrap_or_default(),
            year_end,
            at_current,
            op_current,
            om_current,
            roce_current_pct,
            at_yoy,
            op_yoy,
            roce_current,
        });
    }

    info!(
        rows = records.len(),
        parse_errors = report.parse_errors,
        undated = report.undated_rows,
        coerced = report.coerced_cells,
        "dataset loaded"
    );
    Ok((Dataset::new(records), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str =
        "comp_name,activity,year_end,AT_current,OP_current,OM_current,ROCE_current(%),AT_yoy,OP_yoy,ROCE_current\n";

    #[test]
    fn placeholders_become_missing_values() {
        let csv = format!("{HEADER}Acme,B,Mar-23,\"1,200\",n/a,5.5,12,3,-,12\n");
        let (data, report) = parse_dataset(csv.as_bytes()).unwrap();
        let r = &data.records()[0];
        assert_eq!(r.at_current, Some(1200.0));
        assert_eq!(r.op_current, None);
        assert_eq!(r.op_yoy, None);
        assert_eq!(r.year_end, NaiveDate::from_ymd_opt(2023, 3, 1));
        assert_eq!(report.coerced_cells, 2);
        assert_eq!(report.undated_rows, 0);
        assert_eq!(report.total_rows, 1);
        assert_eq!(report.encoding, "UTF-8");
    }

    #[test]
    fn non_utf8_bytes_are_decoded_not_rejected() {
        let mut bytes = HEADER.as_bytes().to_vec();
        // "Nestlé" in windows-1252
        bytes.extend_from_slice(b"Nestl\xE9,B,Jun-22,1,2,3,4,5,6,7\n");
        let (data, report) = parse_dataset(&bytes).unwrap();
        assert_eq!(data.records()[0].name, "Nestlé");
        assert_eq!(report.encoding, "windows-1252");
    }

    #[test]
    fn utf8_bom_is_stripped_from_header() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(HEADER.as_bytes());
        bytes.extend_from_slice(b"Acme,B,Jun-22,1,2,3,4,5,6,7\n");
        let (data, _) = parse_dataset(&bytes).unwrap();
        assert_eq!(data.records()[0].name, "Acme");
    }

    #[test]
    fn bom_and_windows_1252_byte_together() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(HEADER.as_bytes());
        bytes.extend_from_slice(b"Nestl\xE9,B,Jun-22,1,2,3,4,5,6,7\n");
        let (data, report) = parse_dataset(&bytes).unwrap();
        assert_eq!(data.records()[0].name, "Nestlé");
        assert_eq!(report.encoding, "windows-1252");
    }

    #[test]
    fn date_bounds_skip_undated_rows() {
        let csv = format!(
            "{HEADER}A,B,bogus,,,,,,,\nB,B,Jun-22,,,,,,,\nC,O/L,Jan-21,,,,,,,\nD,B,Dec-23,,,,,,,\n"
        );
        let (data, report) = parse_dataset(csv.as_bytes()).unwrap();
        assert_eq!(report.undated_rows, 1);
        assert_eq!(
            data.date_bounds(),
            Some((
                NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()
            ))
        );
    }

    fn dated(dates: &[&str]) -> Dataset {
        let mut csv = HEADER.to_string();
        for (i, d) in dates.iter().enumerate() {
            csv.push_str(&format!("C{i},B,{d},,,,,,,\n"));
        }
        parse_dataset(csv.as_bytes()).unwrap().0
    }

    fn ym(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn range_defaults_to_observed_bounds() {
        let data = dated(&["Jun-22", "Mar-21", "Dec-23"]);
        assert_eq!(data.range(None, None).unwrap(), (ym(2021, 3), ym(2023, 12)));
        assert_eq!(
            data.range(Some("Jan-22"), None).unwrap(),
            (ym(2022, 1), ym(2023, 12))
        );
        assert_eq!(
            data.range(None, Some("Jun-22")).unwrap(),
            (ym(2021, 3), ym(2022, 6))
        );
    }

    #[test]
    fn range_accepts_a_single_month() {
        let data = dated(&["Jun-22", "Mar-21"]);
        assert_eq!(
            data.range(Some("Jun-22"), Some("Jun-22")).unwrap(),
            (ym(2022, 6), ym(2022, 6))
        );
    }

    #[test]
    fn range_rejects_reversed_bounds() {
        let data = dated(&["Jun-22", "Mar-21"]);
        let err = data.range(Some("Jun-22"), Some("Mar-21")).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::InvalidRange { start, end } if start == ym(2022, 6) && end == ym(2021, 3)
        ));
    }

    #[test]
    fn range_rejects_unparseable_bound() {
        let data = dated(&["Jun-22"]);
        let err = data.range(Some("2022-06"), None).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidYearEnd(ref raw) if raw == "2022-06"));
        assert!(matches!(
            data.range(None, Some("soon")),
            Err(DashboardError::InvalidYearEnd(_))
        ));
    }

    #[test]
    fn range_needs_at_least_one_dated_row() {
        let data = dated(&["bogus"]);
        assert!(matches!(data.range(None, None), Err(DashboardError::NoDatedRows)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_dataset(Path::new("/nonexistent/top150.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/top150.csv"));
    }
}
