// 🏆 Ranker - Descending order by metric, stable on ties, optional top-N

use crate::aggregate::{AggregateRow, AggregateTable};
use crate::geo::{GeoRow, GeoTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Total price (revenue)
    Sum,
    /// Number of records (sales)
    Count,
}

impl Metric {
    pub fn compare<R: MetricRow>(&self, a: &R, b: &R) -> Ordering {
        match self {
            Metric::Sum => a.sum().cmp(&b.sum()),
            Metric::Count => a.count().cmp(&b.count()),
        }
    }
}

/// Anything carrying both metrics can be ranked
pub trait MetricRow {
    fn sum(&self) -> Decimal;
    fn count(&self) -> usize;
}

impl MetricRow for AggregateRow {
    fn sum(&self) -> Decimal {
        self.sum
    }

    fn count(&self) -> usize {
        self.count
    }
}

impl MetricRow for GeoRow {
    fn sum(&self) -> Decimal {
        self.sum
    }

    fn count(&self) -> usize {
        self.count
    }
}

/// Rows in ranked order plus how they were ranked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<R> {
    pub metric: Metric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<NonZeroUsize>,
    pub rows: Vec<R>,
}

pub type RankedTable = Ranked<AggregateRow>;
pub type RankedGeoTable = Ranked<GeoRow>;

impl<R: Clone> Ranked<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows of an already ranked view
    pub fn head(&self, n: NonZeroUsize) -> Ranked<R> {
        Ranked {
            metric: self.metric,
            top_n: Some(n),
            rows: self.rows.iter().take(n.get()).cloned().collect(),
        }
    }
}

/// Stable descending sort of a copy of `rows`, truncated to `top_n`
pub fn rank_rows<R: MetricRow + Clone>(
    rows: &[R],
    metric: Metric,
    top_n: Option<NonZeroUsize>,
) -> Ranked<R> {
    let mut ranked = rows.to_vec();
    // sort_by is stable: equal metrics keep their input order
    ranked.sort_by(|a, b| metric.compare(b, a));

    if let Some(n) = top_n {
        ranked.truncate(n.get());
    }

    Ranked {
        metric,
        top_n,
        rows: ranked,
    }
}

pub fn rank(table: &AggregateTable, metric: Metric, top_n: Option<NonZeroUsize>) -> RankedTable {
    rank_rows(&table.rows, metric, top_n)
}

pub fn rank_geo(table: &GeoTable, metric: Metric, top_n: Option<NonZeroUsize>) -> RankedGeoTable {
    rank_rows(&table.rows, metric, top_n)
}

// ============================================================================
// TESTS
// ============================================================================
