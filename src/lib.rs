//! Company financial performance dashboard: top-N views per segment and a
//! weighted composite ranking over a year-end range.

pub mod errors;
pub mod loader;
pub mod logging;
pub mod output;
pub mod ranking;
pub mod reports;
pub mod types;
pub mod util;

pub use errors::{DashboardError, WeightError};
pub use loader::{load_dataset, parse_dataset, Dataset, LoadReport};
pub use ranking::{rank_max, score, score_with, NullPlacement, Weights};
pub use reports::{default_top_n, filter_by_year_end, filter_segment, select_top};
pub use types::{CompanyRecord, Metric, RankedRow, RankedTable, Segment, TopRow, TopSelection};
