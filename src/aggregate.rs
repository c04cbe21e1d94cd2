// 📊 Aggregation Engine - Grouped revenue and sales counts
// One grouping pass per dimension, each group carrying BOTH accumulators,
// so sum and count can never come from different subsets.

use crate::records::TransactionRecord;
use chrono::{Datelike, Month, NaiveDate};
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// DIMENSIONS & KEYS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    State,
    Month,
    Category,
    Seller,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::State,
        Dimension::Month,
        Dimension::Category,
        Dimension::Seller,
    ];

    pub fn name(&self) -> &str {
        match self {
            Dimension::State => "state",
            Dimension::Month => "month",
            Dimension::Category => "category",
            Dimension::Seller => "seller",
        }
    }

    /// Group key of a record along this dimension
    pub fn key_of(&self, record: &TransactionRecord) -> DimensionKey {
        match self {
            Dimension::State => DimensionKey::State(record.state.clone()),
            Dimension::Month => DimensionKey::Month(YearMonth::of(record.purchase_date)),
            Dimension::Category => DimensionKey::Category(record.category.clone()),
            Dimension::Seller => DimensionKey::Seller(record.seller.clone()),
        }
    }
}

/// Calendar month bucket. Ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Bucket a date, truncating the day
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// English month name, derived from `month`
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("")
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("YearMonth", 3)?;
        state.serialize_field("year", &self.year)?;
        state.serialize_field("month", &self.month)?;
        state.serialize_field("month_name", self.month_name())?;
        state.end()
    }
}

/// Group key. Every row of one table carries the same variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "dimension", content = "key", rename_all = "snake_case")]
pub enum DimensionKey {
    State(String),
    Month(YearMonth),
    Category(String),
    Seller(String),
}

impl DimensionKey {
    /// The state code, when this is a state key
    pub fn as_state(&self) -> Option<&str> {
        match self {
            DimensionKey::State(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_month(&self) -> Option<YearMonth> {
        match self {
            DimensionKey::Month(ym) => Some(*ym),
            _ => None,
        }
    }

    /// Display label (state code, "January 2022", category, seller)
    pub fn label(&self) -> String {
        match self {
            DimensionKey::State(s) | DimensionKey::Category(s) | DimensionKey::Seller(s) => {
                s.clone()
            }
            DimensionKey::Month(ym) => ym.to_string(),
        }
    }
}

// ============================================================================
// AGGREGATE TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: DimensionKey,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    pub count: usize,
}

/// One row per distinct key, ascending by key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub dimension: Dimension,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn empty(dimension: Dimension) -> Self {
        AggregateTable {
            dimension,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &DimensionKey) -> Option<&AggregateRow> {
        self.rows.iter().find(|row| &row.key == key)
    }

    pub fn total_sum(&self) -> Decimal {
        self.rows.iter().map(|row| row.sum).sum()
    }

    pub fn total_count(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }
}

#[derive(Default)]
struct Accumulator {
    sum: Decimal,
    count: usize,
}

/// Group `subset` along `dimension`, summing price and counting records
pub fn aggregate(subset: &[TransactionRecord], dimension: Dimension) -> AggregateTable {
    let mut groups: BTreeMap<DimensionKey, Accumulator> = BTreeMap::new();

    for record in subset {
        let acc = groups.entry(dimension.key_of(record)).or_default();
        acc.sum += record.price;
        acc.count += 1;
    }

    let rows = groups
        .into_iter()
        .map(|(key, acc)| AggregateRow {
            key,
            sum: acc.sum,
            count: acc.count,
        })
        .collect();

    AggregateTable { dimension, rows }
}

// ============================================================================
// TESTS
// ============================================================================
