//! Composite ranking of companies over three year-over-year metrics.
//!
//! Each metric is ranked ascending with max-tie ranks, the ranks are blended
//! with user weights into a composite score, and the table is ordered so the
//! highest score takes presentation rank 1.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::errors::WeightError;
use crate::types::{CompanyRecord, RankedRow, RankedTable};

pub const WEIGHT_STEP: u32 = 10;
pub const WEIGHT_MAX: u32 = 90;
pub const WEIGHT_TOTAL: u32 = 100;

/// Metric weights in percent. Only obtainable through [`Weights::new`], so a
/// value of this type always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Weights {
    at: u32,
    op: u32,
    roce: u32,
}

impl Weights {
    pub fn new(at: u32, op: u32, roce: u32) -> Result<Self, WeightError> {
        for (metric, value) in [("AT", at), ("OP", op), ("ROCE", roce)] {
            if value > WEIGHT_MAX || value % WEIGHT_STEP != 0 {
                return Err(WeightError::OutOfRange { metric, value });
            }
        }
        let total = at + op + roce;
        if total != WEIGHT_TOTAL {
            return Err(WeightError::BadTotal { total });
        }
        Ok(Self { at, op, roce })
    }

    pub fn at(&self) -> u32 {
        self.at
    }

    pub fn op(&self) -> u32 {
        self.op
    }

    pub fn roce(&self) -> u32 {
        self.roce
    }

    /// Values offered by each weight selector: 0, 10, ..., 90.
    pub fn choices() -> impl Iterator<Item = u32> {
        (0..=WEIGHT_MAX).step_by(WEIGHT_STEP as usize)
    }
}

impl FromStr for Weights {
    type Err = WeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| WeightError::Malformed(s.to_string()))?;
        match parts.as_slice() {
            [at, op, roce] => Weights::new(*at, *op, *roce),
            _ => Err(WeightError::Malformed(s.to_string())),
        }
    }
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AT {}% / OP {}% / ROCE {}%", self.at, self.op, self.roce)
    }
}

/// Where missing values land when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPlacement {
    /// Missing values stay unranked.
    Keep,
    /// Missing values rank below every present value.
    Top,
}

/// Ascending rank where every member of a tie group receives the highest
/// position of that group: `[10, 20, 20, 30]` ranks as `[1, 3, 3, 4]`.
/// Values that do not compare with themselves (NaN) count as missing.
pub fn rank_max<T: PartialOrd + Copy>(
    values: &[Option<T>],
    nulls: NullPlacement,
) -> Vec<Option<usize>> {
    let mut present: Vec<(usize, T)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .filter(|(_, v)| v.partial_cmp(v).is_some())
        .collect();
    present.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let missing = values.len() - present.len();
    let offset = match nulls {
        NullPlacement::Keep => 0,
        NullPlacement::Top => missing,
    };
    let mut ranks: Vec<Option<usize>> = match nulls {
        NullPlacement::Keep => vec![None; values.len()],
        NullPlacement::Top => vec![Some(missing); values.len()],
    };

    let mut start = 0;
    while start < present.len() {
        let mut end = start + 1;
        while end < present.len()
            && present[end].1.partial_cmp(&present[start].1) == Some(Ordering::Equal)
        {
            end += 1;
        }
        for &(idx, _) in &present[start..end] {
            ranks[idx] = Some(offset + end);
        }
        start = end;
    }
    ranks
}

/// Validate the weights, then rank. A rejected weight triple produces no table.
pub fn score(
    rows: &[&CompanyRecord],
    weight_at: u32,
    weight_op: u32,
    weight_roce: u32,
) -> Result<RankedTable, WeightError> {
    let weights = Weights::new(weight_at, weight_op, weight_roce)?;
    Ok(score_with(rows, &weights))
}

pub fn score_with(rows: &[&CompanyRecord], weights: &Weights) -> RankedTable {
    let column = |f: fn(&CompanyRecord) -> Option<f64>| -> Vec<Option<f64>> {
        rows.iter().map(|r| f(r)).collect()
    };
    let at_ranks = rank_max(&column(|r| r.at_yoy), NullPlacement::Keep);
    let op_ranks = rank_max(&column(|r| r.op_yoy), NullPlacement::Keep);
    let roce_ranks = rank_max(&column(|r| r.roce_current), NullPlacement::Keep);

    let scores: Vec<Option<usize>> = (0..rows.len())
        .map(|i| {
            Some(
                at_ranks[i]? * weights.at as usize
                    + op_ranks[i]? * weights.op as usize
                    + roce_ranks[i]? * weights.roce as usize,
            )
        })
        .collect();

    let n = rows.len();
    let positions = rank_max(&scores, NullPlacement::Top);

    let mut order: Vec<usize> = (0..n).collect();
    // Stable: equal scores keep input order, missing scores go last.
    order.sort_by(|&a, &b| match (scores[a], scores[b]) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let ranked: Vec<RankedRow> = order
        .into_iter()
        .map(|i| {
            let r = rows[i];
            RankedRow {
                rank: n + 1 - positions[i].unwrap_or(n),
                company: r.name.clone(),
                at_yoy: r.at_yoy,
                op_yoy: r.op_yoy,
                roce_current: r.roce_current,
                at_rank: at_ranks[i],
                op_rank: op_ranks[i],
                roce_rank: roce_ranks[i],
                score: scores[i],
            }
        })
        .collect();

    debug!(
        rows = n,
        unscored = scores.iter().filter(|s| s.is_none()).count(),
        %weights,
        "composite ranking computed"
    );
    RankedTable {
        weights: *weights,
        rows: ranked,
    }
}
