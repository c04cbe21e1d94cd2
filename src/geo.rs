// 🗺️ Geo-Join Stage - Attach state coordinates to the state aggregate
// Coordinates are looked up in a table built once per filtered subset.

use crate::aggregate::{AggregateRow, AggregateTable, Dimension, DimensionKey};
use crate::error::{DashboardError, DashboardResult};
use crate::records::TransactionRecord;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// state → coordinates, first record of each state is the representative
#[derive(Debug, Clone, Default)]
pub struct CoordinateIndex {
    by_state: HashMap<String, Coordinates>,
}

impl CoordinateIndex {
    pub fn build(subset: &[TransactionRecord]) -> Self {
        let mut by_state: HashMap<String, Coordinates> = HashMap::new();

        for record in subset {
            let coords = Coordinates {
                latitude: record.latitude,
                longitude: record.longitude,
            };
            match by_state.get(&record.state) {
                Some(existing) if *existing != coords => {
                    warn!(
                        state = %record.state,
                        kept = ?existing,
                        ignored = ?coords,
                        "records of one state disagree on coordinates"
                    );
                }
                Some(_) => {}
                None => {
                    by_state.insert(record.state.clone(), coords);
                }
            }
        }

        CoordinateIndex { by_state }
    }

    pub fn get(&self, state: &str) -> Option<Coordinates> {
        self.by_state.get(state).copied()
    }

    pub fn len(&self) -> usize {
        self.by_state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_state.is_empty()
    }
}

// ============================================================================
// GEO TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoRow {
    pub state: String,
    pub coordinates: Coordinates,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    pub count: usize,
}

impl GeoRow {
    /// Back to a plain aggregate row (for ranking)
    pub fn to_aggregate_row(&self) -> AggregateRow {
        AggregateRow {
            key: DimensionKey::State(self.state.clone()),
            sum: self.sum,
            count: self.count,
        }
    }
}

/// State aggregate with coordinates, row order unchanged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoTable {
    pub rows: Vec<GeoRow>,
}

impl GeoTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_aggregate_table(&self) -> AggregateTable {
        AggregateTable {
            dimension: Dimension::State,
            rows: self.rows.iter().map(GeoRow::to_aggregate_row).collect(),
        }
    }
}

/// Join coordinates onto every row of a state table.
///
/// Fails with `MissingCoordinate` when a row's state has no record in
/// `subset`, i.e. the table was not derived from this subset.
pub fn attach_coordinates(
    state_table: &AggregateTable,
    subset: &[TransactionRecord],
) -> DashboardResult<GeoTable> {
    let index = CoordinateIndex::build(subset);
    attach_with_index(state_table, &index)
}

/// Same as `attach_coordinates` with a prebuilt index
pub fn attach_with_index(
    state_table: &AggregateTable,
    index: &CoordinateIndex,
) -> DashboardResult<GeoTable> {
    let mut rows = Vec::with_capacity(state_table.len());

    for row in &state_table.rows {
        let state = row.key.as_state().ok_or_else(|| DashboardError::MissingCoordinate {
            state: row.key.label(),
        })?;
        let coordinates = index
            .get(state)
            .ok_or_else(|| DashboardError::MissingCoordinate {
                state: state.to_string(),
            })?;

        rows.push(GeoRow {
            state: state.to_string(),
            coordinates,
            sum: row.sum,
            count: row.count,
        });
    }

    Ok(GeoTable { rows })
}
