// 📈 Dashboard Pipeline - Filter → Aggregate ×4 → Geo-Join → Rank
// Every table of a snapshot derives from the same filtered subset.

use crate::aggregate::{aggregate, AggregateTable, Dimension};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::filter::{filter, FilterCriteria};
use crate::format::MagnitudeFormatter;
use crate::geo::{attach_with_index, CoordinateIndex};
use crate::rank::{rank, rank_geo, Metric, RankedGeoTable, RankedTable};
use crate::records::TransactionRecord;
use rust_decimal::Decimal;
use serde::Serialize;
use std::num::NonZeroUsize;
use tracing::{debug, info_span};

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Everything the charts and metrics need for one filter selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub criteria: FilterCriteria,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub total_sales: usize,
    pub total_revenue_display: String,
    pub total_sales_display: String,

    /// Map tables, full, ranked by revenue / by sales
    pub revenue_by_state: RankedGeoTable,
    pub sales_by_state: RankedGeoTable,
    pub top_states_by_revenue: RankedGeoTable,
    pub top_states_by_sales: RankedGeoTable,

    /// Chronological month table (line charts)
    pub monthly: AggregateTable,

    pub revenue_by_category: RankedTable,
    pub sales_by_category: RankedTable,

    /// Seller table in key order, plus the leaderboards
    pub sellers: AggregateTable,
    pub top_sellers_by_revenue: RankedTable,
    pub top_sellers_by_sales: RankedTable,
}

impl DashboardSnapshot {
    pub fn is_empty(&self) -> bool {
        self.total_sales == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Revenue: {}, Sales: {}, States: {}, Categories: {}, Sellers: {}",
            self.total_revenue_display,
            self.total_sales_display,
            self.revenue_by_state.len(),
            self.revenue_by_category.len(),
            self.sellers.len()
        )
    }
}

// ============================================================================
// DASHBOARD ENGINE
// ============================================================================

pub struct DashboardEngine {
    config: DashboardConfig,
    formatter: MagnitudeFormatter,
}

impl DashboardEngine {
    pub fn new(config: DashboardConfig) -> Self {
        let formatter = MagnitudeFormatter::from_config(&config);
        DashboardEngine { config, formatter }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Leaderboard size: the configured default, or a requested size inside
    /// the configured bounds
    pub fn top_sellers(&self, requested: Option<usize>) -> DashboardResult<NonZeroUsize> {
        let size = requested.unwrap_or(self.config.default_top_sellers);
        let range = self.config.top_sellers_range();

        if !range.contains(&size) {
            return Err(DashboardError::invalid_selection(
                "top",
                format!("{} is outside {}..={}", size, range.start(), range.end()),
            ));
        }

        NonZeroUsize::new(size)
            .ok_or_else(|| DashboardError::invalid_selection("top", "must be a positive integer"))
    }

    /// Run the whole pipeline for one selection
    pub fn snapshot(
        &self,
        records: &[TransactionRecord],
        criteria: &FilterCriteria,
        top_sellers: Option<usize>,
    ) -> DashboardResult<DashboardSnapshot> {
        let span = info_span!("snapshot", records = records.len());
        let _guard = span.enter();

        let top_sellers = self.top_sellers(top_sellers)?;
        let subset = filter(records, criteria);
        debug!(subset = subset.len(), ?criteria, "filtered records");

        let by_state = aggregate(&subset, Dimension::State);
        let monthly = aggregate(&subset, Dimension::Month);
        let by_category = aggregate(&subset, Dimension::Category);
        let sellers = aggregate(&subset, Dimension::Seller);

        let index = CoordinateIndex::build(&subset);
        let geo = attach_with_index(&by_state, &index)?;

        let revenue_by_state = rank_geo(&geo, Metric::Sum, None);
        let sales_by_state = rank_geo(&geo, Metric::Count, None);

        let (top_states_by_revenue, top_states_by_sales) =
            match NonZeroUsize::new(self.config.top_states) {
                Some(n) => (revenue_by_state.head(n), sales_by_state.head(n)),
                None => (revenue_by_state.clone(), sales_by_state.clone()),
            };

        let total_revenue: Decimal = subset.iter().map(|r| r.price).sum();
        let total_sales = subset.len();

        let snapshot = DashboardSnapshot {
            criteria: criteria.clone(),
            total_revenue,
            total_sales,
            total_revenue_display: self
                .formatter
                .format_decimal(total_revenue, &self.config.revenue_prefix),
            total_sales_display: self.formatter.format(total_sales as f64, ""),
            revenue_by_state,
            sales_by_state,
            top_states_by_revenue,
            top_states_by_sales,
            monthly,
            revenue_by_category: rank(&by_category, Metric::Sum, None),
            sales_by_category: rank(&by_category, Metric::Count, None),
            top_sellers_by_revenue: rank(&sellers, Metric::Sum, Some(top_sellers)),
            top_sellers_by_sales: rank(&sellers, Metric::Count, Some(top_sellers)),
            sellers,
        };

        debug!(summary = %snapshot.summary(), "snapshot built");
        Ok(snapshot)
    }
}

impl Default for DashboardEngine {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

/// Pipeline with default configuration and leaderboard size
pub fn build_snapshot(
    records: &[TransactionRecord],
    criteria: &FilterCriteria,
) -> DashboardResult<DashboardSnapshot> {
    DashboardEngine::default().snapshot(records, criteria, None)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{DimensionKey, YearMonth};
    use chrono::NaiveDate;

    fn record(
        state: &str,
        price: i64,
        (year, month): (i32, u32),
        category: &str,
        seller: &str,
    ) -> TransactionRecord {
        let (lat, lon) = match state {
            "A" => (-10.0, -40.0),
            _ => (-20.0, -50.0),
        };
        TransactionRecord::new(
            NaiveDate::from_ymd_opt(year, month, 10).unwrap(),
            Decimal::from(price),
            state,
            lat,
            lon,
            category,
            seller,
        )
    }

    fn scenario() -> Vec<TransactionRecord> {
        vec![
            record("A", 100, (2022, 1), "X", "S1"),
            record("A", 50, (2022, 1), "Y", "S2"),
            record("B", 200, (2022, 2), "X", "S1"),
        ]
    }

    fn labels<R>(rows: &[R], label: impl Fn(&R) -> String) -> Vec<String> {
        rows.iter().map(label).collect()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let records = scenario();
        let snapshot = build_snapshot(&records, &FilterCriteria::all()).unwrap();

        let by_state = snapshot.revenue_by_state.rows.clone();
        assert_eq!(labels(&by_state, |r| r.state.clone()), vec!["B", "A"]);
        assert_eq!(by_state[0].sum, Decimal::from(200));
        assert_eq!(by_state[0].count, 1);
        assert_eq!(by_state[1].sum, Decimal::from(150));
        assert_eq!(by_state[1].count, 2);

        let categories = &snapshot.revenue_by_category.rows;
        assert_eq!(categories[0].key, DimensionKey::Category("X".to_string()));
        assert_eq!(categories[0].sum, Decimal::from(300));
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories[1].key, DimensionKey::Category("Y".to_string()));
        assert_eq!(categories[1].sum, Decimal::from(50));
        assert_eq!(categories[1].count, 1);

        let category_sales: Vec<(String, usize)> = snapshot
            .sales_by_category
            .rows
            .iter()
            .map(|r| (r.key.label(), r.count))
            .collect();
        assert_eq!(
            category_sales,
            vec![("X".to_string(), 2), ("Y".to_string(), 1)]
        );
        assert_eq!(snapshot.sales_by_category.metric, Metric::Count);

        assert_eq!(snapshot.total_revenue, Decimal::from(350));
        assert_eq!(snapshot.total_sales, 3);
        assert_eq!(snapshot.total_revenue_display, "R$ 350.000 units");
        assert_eq!(snapshot.total_sales_display, "3.000 units");
    }

    #[test]
    fn test_state_count_ranking_and_coordinates() {
        let snapshot = build_snapshot(&scenario(), &FilterCriteria::all()).unwrap();
        let by_sales = &snapshot.sales_by_state.rows;
        assert_eq!(by_sales[0].state, "A");
        assert_eq!(by_sales[0].coordinates.latitude, -10.0);
        assert_eq!(by_sales[1].state, "B");
        assert_eq!(by_sales[1].coordinates.longitude, -50.0);
    }

    #[test]
    fn test_monthly_is_chronological() {
        let snapshot = build_snapshot(&scenario(), &FilterCriteria::all()).unwrap();
        let months: Vec<YearMonth> = snapshot
            .monthly
            .rows
            .iter()
            .filter_map(|r| r.key.as_month())
            .collect();
        assert_eq!(
            months,
            vec![YearMonth { year: 2022, month: 1 }, YearMonth { year: 2022, month: 2 }]
        );
        assert_eq!(snapshot.monthly.rows[0].sum, Decimal::from(150));
    }

    #[test]
    fn test_seller_leaderboards() {
        let engine = DashboardEngine::default();
        let snapshot = engine
            .snapshot(&scenario(), &FilterCriteria::all(), Some(2))
            .unwrap();

        let revenue = &snapshot.top_sellers_by_revenue.rows;
        assert_eq!(revenue.len(), 2);
        assert_eq!(revenue[0].key, DimensionKey::Seller("S1".to_string()));
        assert_eq!(revenue[0].sum, Decimal::from(300));

        let sales = &snapshot.top_sellers_by_sales.rows;
        assert_eq!(sales[0].key, DimensionKey::Seller("S1".to_string()));
        assert_eq!(sales[0].count, 2);
    }

    #[test]
    fn test_top_sellers_bounds() {
        let engine = DashboardEngine::default();
        assert_eq!(engine.top_sellers(None).unwrap().get(), 5);
        assert_eq!(engine.top_sellers(Some(10)).unwrap().get(), 10);
        assert!(engine.top_sellers(Some(1)).is_err());
        assert!(engine.top_sellers(Some(11)).is_err());
    }

    #[test]
    fn test_all_tables_share_the_filtered_subset() {
        let criteria = FilterCriteria::all().with_seller("S1");
        let snapshot = build_snapshot(&scenario(), &criteria).unwrap();

        assert_eq!(snapshot.total_sales, 2);
        assert_eq!(snapshot.total_revenue, Decimal::from(300));
        assert_eq!(snapshot.monthly.total_count(), 2);
        assert_eq!(snapshot.sellers.total_sum(), Decimal::from(300));
        assert_eq!(
            snapshot.revenue_by_state.rows.iter().map(|r| r.count).sum::<usize>(),
            2
        );
    }

    #[test]
    fn test_empty_selection_degrades_gracefully() {
        let criteria = FilterCriteria::all().with_year(1999);
        let snapshot = build_snapshot(&scenario(), &criteria).unwrap();

        assert!(snapshot.is_empty());
        assert!(snapshot.revenue_by_state.is_empty());
        assert!(snapshot.top_states_by_sales.is_empty());
        assert!(snapshot.monthly.is_empty());
        assert!(snapshot.top_sellers_by_revenue.is_empty());
        assert_eq!(snapshot.total_revenue, Decimal::ZERO);
        assert_eq!(snapshot.total_revenue_display, "R$ 0.000 units");
    }

    #[test]
    fn test_top_states_truncates() {
        // Revenue grows along the list, sales count shrinks along it
        let states = ["AC", "AL", "AM", "AP", "BA", "CE", "DF"];
        let mut records = Vec::new();
        for (i, uf) in states.iter().enumerate() {
            records.push(record(uf, 10 * (i as i64 + 1), (2021, 3), "X", "S1"));
            for _ in 0..(states.len() - i) {
                records.push(record(uf, 0, (2021, 3), "X", "S1"));
            }
        }

        let snapshot = build_snapshot(&records, &FilterCriteria::all()).unwrap();
        assert_eq!(snapshot.revenue_by_state.len(), 7);
        assert_eq!(snapshot.top_states_by_revenue.len(), 5);
        assert_eq!(snapshot.top_states_by_revenue.rows[0].state, "DF");

        assert_eq!(snapshot.sales_by_state.len(), 7);
        let top_by_sales: Vec<&str> = snapshot
            .top_states_by_sales
            .rows
            .iter()
            .map(|r| r.state.as_str())
            .collect();
        assert_eq!(top_by_sales, vec!["AC", "AL", "AM", "AP", "BA"]);
        assert_eq!(snapshot.top_states_by_sales.rows[0].count, 8);
    }

    #[test]
    fn test_revenue_display_is_exact() {
        let records = vec![
            record("A", 999_999, (2022, 1), "X", "S1"),
            record("B", 1, (2022, 1), "X", "S1"),
        ];
        let snapshot = build_snapshot(&records, &FilterCriteria::all()).unwrap();
        assert_eq!(snapshot.total_revenue, Decimal::from(1_000_000));
        assert_eq!(snapshot.total_revenue_display, "R$ 1.000 million");
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = build_snapshot(&scenario(), &FilterCriteria::all()).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["total_sales"], 3);
        assert_eq!(json["revenue_by_state"]["metric"], "sum");
        assert_eq!(json["revenue_by_state"]["rows"][0]["state"], "B");
        assert_eq!(json["monthly"]["rows"][1]["key"]["key"]["month_name"], "February");
    }
}
