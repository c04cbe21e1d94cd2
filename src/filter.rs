// 🔎 Filter Engine - Narrow the record store to a working subset
// Region, year and seller predicates compose by AND.

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::records::{RecordStore, TransactionRecord};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeSet;

// ============================================================================
// FILTER CRITERIA
// ============================================================================

/// User-selected restriction. Absent/empty fields mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub region: Option<String>,
    pub year: Option<i32>,
    pub sellers: BTreeSet<String>,
}

impl FilterCriteria {
    /// No restriction at all
    pub fn all() -> Self {
        FilterCriteria::default()
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_seller(mut self, seller: &str) -> Self {
        self.sellers.insert(seller.to_string());
        self
    }

    /// Build criteria from the dashboard's selection widgets, validating each
    /// choice against the configuration and the loaded records.
    ///
    /// - `region`: a configured region, or the "all" choice (`None` also means all)
    /// - `year`: inside the configured range, or `None` for all time
    /// - `sellers`: each must be a seller present in the store
    pub fn from_selection(
        config: &DashboardConfig,
        store: &RecordStore,
        region: Option<&str>,
        year: Option<i32>,
        sellers: &[String],
    ) -> DashboardResult<Self> {
        let region = match region.map(str::trim).filter(|r| !r.is_empty()) {
            None => None,
            Some(choice) if config.is_all_regions(choice) => None,
            Some(choice) => match config.find_region(choice) {
                Some(found) => Some(found.to_lowercase()),
                None => {
                    return Err(DashboardError::invalid_selection(
                        "region",
                        format!("'{}' is not one of {:?}", choice, config.regions),
                    ))
                }
            },
        };

        if let Some(y) = year {
            if !config.year_range().contains(&y) {
                return Err(DashboardError::invalid_selection(
                    "year",
                    format!("{} is outside {}..={}", y, config.first_year, config.last_year),
                ));
            }
        }

        let known = store.sellers();
        let mut selected = BTreeSet::new();
        for seller in sellers {
            if !known.iter().any(|k| k == seller) {
                return Err(DashboardError::invalid_selection(
                    "sellers",
                    format!("unknown seller '{}'", seller),
                ));
            }
            selected.insert(seller.clone());
        }

        Ok(FilterCriteria {
            region,
            year,
            sellers: selected,
        })
    }

    /// Region normalized for comparison, `None` when unrestricted
    fn normalized_region(&self) -> Option<String> {
        self.region
            .as_deref()
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
    }

    fn accepts(&self, record: &TransactionRecord, region: Option<&str>) -> bool {
        if let Some(region) = region {
            if record.region.to_lowercase() != region {
                return false;
            }
        }

        if let Some(year) = self.year {
            if record.purchase_date.year() != year {
                return false;
            }
        }

        self.sellers.is_empty() || self.sellers.contains(&record.seller)
    }
}

// ============================================================================
// FILTER
// ============================================================================

/// Records matching every predicate of `criteria`, in their original order
pub fn filter(records: &[TransactionRecord], criteria: &FilterCriteria) -> Vec<TransactionRecord> {
    let region = criteria.normalized_region();
    records
        .iter()
        .filter(|r| criteria.accepts(r, region.as_deref()))
        .cloned()
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
