// Sales Dashboard - Core Library
// Aggregation & ranking engine behind the sales dashboard, shared by the CLI and API server

pub mod records;    // Record Store + provider loader
pub mod config;     // Selectable regions, years, leaderboard bounds
pub mod error;      // Typed engine errors
pub mod filter;     // Filter Engine
pub mod aggregate;  // Aggregation Engine
pub mod geo;        // Geo-Join Stage
pub mod rank;       // Ranker
pub mod format;     // Metric Formatter
pub mod dashboard;  // Pipeline composition

// Re-export commonly used types
pub use records::{RecordStore, TransactionRecord, RawSale, region_for_state};
pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use filter::{filter, FilterCriteria};
pub use aggregate::{
    aggregate, AggregateRow, AggregateTable, Dimension, DimensionKey, YearMonth,
};
pub use geo::{attach_coordinates, Coordinates, CoordinateIndex, GeoRow, GeoTable};
pub use rank::{rank, rank_geo, Metric, MetricRow, Ranked, RankedGeoTable, RankedTable};
pub use format::{format_magnitude, MagnitudeFormatter};
pub use dashboard::{build_snapshot, DashboardEngine, DashboardSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
