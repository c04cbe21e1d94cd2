// ⚙️ Dashboard Configuration - Choices offered to the user, as data
// Loaded from JSON (same way rules are loaded), with sensible defaults.

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Selectable regions. The `all_regions` entry means no region filter.
    pub regions: Vec<String>,

    /// Region choice that disables the region filter
    pub all_regions: String,

    /// Selectable years (inclusive)
    pub first_year: i32,
    pub last_year: i32,

    /// Seller leaderboard size: default and bounds (inclusive)
    pub default_top_sellers: usize,
    pub min_top_sellers: usize,
    pub max_top_sellers: usize,

    /// Rows shown in the "top states" bars
    pub top_states: usize,

    /// Formatter settings
    pub decimals: usize,
    pub revenue_prefix: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            regions: vec![
                "Brasil".to_string(),
                "Centro-Oeste".to_string(),
                "Nordeste".to_string(),
                "Norte".to_string(),
                "Sudeste".to_string(),
                "Sul".to_string(),
            ],
            all_regions: "Brasil".to_string(),
            first_year: 2020,
            last_year: 2023,
            default_top_sellers: 5,
            min_top_sellers: 2,
            max_top_sellers: 10,
            top_states: 5,
            decimals: 3,
            revenue_prefix: "R$".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a JSON file. Missing keys fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: DashboardConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    pub fn year_range(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    pub fn top_sellers_range(&self) -> RangeInclusive<usize> {
        self.min_top_sellers..=self.max_top_sellers
    }

    /// Case-insensitive lookup of a configured region name
    pub fn find_region(&self, choice: &str) -> Option<&str> {
        let wanted = choice.trim().to_lowercase();
        self.regions
            .iter()
            .find(|r| r.to_lowercase() == wanted)
            .map(|r| r.as_str())
    }

    pub fn is_all_regions(&self, choice: &str) -> bool {
        choice.trim().eq_ignore_ascii_case(&self.all_regions)
    }
}
