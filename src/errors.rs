use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset has no rows with a parseable year_end")]
    NoDatedRows,
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("unrecognised year-end '{0}', expected a value like Mar-23")]
    InvalidYearEnd(String),
    #[error(transparent)]
    Weights(#[from] WeightError),
}

/// Rejection produced by the weight gate in front of the scoring engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeightError {
    #[error("{metric} weight {value} must be a multiple of 10 between 0 and 90")]
    OutOfRange { metric: &'static str, value: u32 },
    #[error("Total weight must add up to 100 (got {total})")]
    BadTotal { total: u32 },
    #[error("expected three comma separated weights like 30,30,40, got '{0}'")]
    Malformed(String),
}
