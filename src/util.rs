// Utility helpers for parsing and number formatting.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume typed values, with `None` standing in for
// anything that could not be coerced.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64`, coercing anything unusable to `None`.
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Placeholders such as `"n/a"`, `"-"` or `"NaN"` become `None`.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    let v = s.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Parse an abbreviated month-year period such as `Mar-23` into the first
/// day of that month.
pub fn parse_year_end(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // chrono needs a day to build a `NaiveDate`.
    NaiveDate::parse_from_str(&format!("01-{}", s), "%d-%b-%y").ok()
}

pub fn format_year_end(d: NaiveDate) -> String {
    d.format("%b-%y").to_string()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Missing values render as `-` in tables.
pub fn format_opt(v: &Option<f64>) -> String {
    match v {
        Some(v) => format_number(*v, 2),
        None => "-".to_string(),
    }
}

pub fn format_opt_rank(v: &Option<usize>) -> String {
    match v {
        Some(v) => format_int(*v),
        None => "-".to_string(),
    }
}
