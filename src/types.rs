use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::ranking::Weights;
use crate::util::{format_opt, format_opt_rank};

/// One CSV row as it appears on disk. Every column is optional text so a
/// malformed cell never fails the whole row.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "comp_name")]
    pub comp_name: Option<String>,
    #[serde(rename = "activity")]
    pub activity: Option<String>,
    #[serde(rename = "year_end")]
    pub year_end: Option<String>,
    #[serde(rename = "AT_current")]
    pub at_current: Option<String>,
    #[serde(rename = "OP_current")]
    pub op_current: Option<String>,
    #[serde(rename = "OM_current")]
    pub om_current: Option<String>,
    #[serde(rename = "ROCE_current(%)")]
    pub roce_current_pct: Option<String>,
    #[serde(rename = "AT_yoy")]
    pub at_yoy: Option<String>,
    #[serde(rename = "OP_yoy")]
    pub op_yoy: Option<String>,
    #[serde(rename = "ROCE_current")]
    pub roce_current: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    pub name: String,
    pub activity: String,
    /// First day of the fiscal year-end month, `None` when unparseable.
    pub year_end: Option<NaiveDate>,
    pub at_current: Option<f64>,
    pub op_current: Option<f64>,
    pub om_current: Option<f64>,
    pub roce_current_pct: Option<f64>,
    pub at_yoy: Option<f64>,
    pub op_yoy: Option<f64>,
    pub roce_current: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Segment {
    Branded,
    OwnBranded,
}

impl Segment {
    pub fn code(self) -> &'static str {
        match self {
            Segment::Branded => "B",
            Segment::OwnBranded => "O/L",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Segment::Branded => "Branded companies",
            Segment::OwnBranded => "Own Branded companies",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    #[value(name = "turnover")]
    AnnualizedTurnover,
    #[value(name = "profit")]
    OperatingProfit,
    #[value(name = "margin")]
    OperatingMargin,
    #[value(name = "roce")]
    Roce,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AnnualizedTurnover,
        Metric::OperatingProfit,
        Metric::OperatingMargin,
        Metric::Roce,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::AnnualizedTurnover => "Current annualized turnover",
            Metric::OperatingProfit => "Current operating profit",
            Metric::OperatingMargin => "Current operating margin",
            Metric::Roce => "Current ROCE",
        }
    }

    pub fn value(self, record: &CompanyRecord) -> Option<f64> {
        match self {
            Metric::AnnualizedTurnover => record.at_current,
            Metric::OperatingProfit => record.op_current,
            Metric::OperatingMargin => record.om_current,
            Metric::Roce => record.roce_current_pct,
        }
    }
}

/// One bar of the top-N chart.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TopRow {
    #[serde(rename = "Position")]
    #[tabled(rename = "#")]
    pub position: usize,
    #[serde(rename = "Company")]
    #[tabled(rename = "Company")]
    pub company: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value", display_with = "format_opt")]
    pub value: Option<f64>,
    #[serde(skip)]
    #[tabled(rename = "")]
    pub bar: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopSelection {
    pub metric: Metric,
    pub rows: Vec<TopRow>,
}

impl TopSelection {
    pub fn heading(&self) -> String {
        format!("Top {} {}", self.rows.len(), self.metric.label())
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RankedRow {
    #[serde(rename = "rank")]
    #[tabled(rename = "rank")]
    pub rank: usize,
    #[serde(rename = "Company name")]
    #[tabled(rename = "Company name")]
    pub company: String,
    #[serde(rename = "AT y-o-y (%)")]
    #[tabled(rename = "AT y-o-y (%)", display_with = "format_opt")]
    pub at_yoy: Option<f64>,
    #[serde(rename = "OP y-o-y (%)")]
    #[tabled(rename = "OP y-o-y (%)", display_with = "format_opt")]
    pub op_yoy: Option<f64>,
    #[serde(rename = "current ROCE (%)")]
    #[tabled(rename = "current ROCE (%)", display_with = "format_opt")]
    pub roce_current: Option<f64>,
    #[serde(rename = "at_rank")]
    #[tabled(skip)]
    pub at_rank: Option<usize>,
    #[serde(rename = "op_rank")]
    #[tabled(skip)]
    pub op_rank: Option<usize>,
    #[serde(rename = "roce_rank")]
    #[tabled(skip)]
    pub roce_rank: Option<usize>,
    #[serde(rename = "composite score")]
    #[tabled(rename = "composite score", display_with = "format_opt_rank")]
    pub score: Option<usize>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RankedTable {
    pub weights: Weights,
    pub rows: Vec<RankedRow>,
}
