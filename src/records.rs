// 🧾 Record Store - Sales transactions as immutable values
// Loads the provider export (JSON array or CSV) and holds it read-only.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Date format used by the provider for "Data da Compra"
pub const PURCHASE_DATE_FORMAT: &str = "%d/%m/%Y";

// ============================================================================
// RAW RECORD (provider columns)
// ============================================================================

/// One row exactly as the provider ships it
#[derive(Debug, Clone, Deserialize)]
pub struct RawSale {
    #[serde(rename = "Produto", default)]
    pub product: String,

    #[serde(rename = "Categoria do Produto")]
    pub category: String,

    #[serde(rename = "Preço")]
    pub price: f64,

    #[serde(rename = "Frete", default)]
    pub freight: f64,

    #[serde(rename = "Data da Compra")]
    pub purchase_date: String,

    #[serde(rename = "Vendedor")]
    pub seller: String,

    #[serde(rename = "Local da compra")]
    pub state: String,

    #[serde(rename = "Avaliação da compra", default)]
    pub rating: Option<u8>,

    #[serde(rename = "Tipo de pagamento", default)]
    pub payment_type: String,

    #[serde(rename = "Quantidade de parcelas", default)]
    pub installments: Option<u32>,

    pub lat: f64,
    pub lon: f64,
}

// ============================================================================
// TRANSACTION RECORD
// ============================================================================

/// A parsed sales transaction. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub purchase_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
    pub seller: String,
    /// Derived from `state`; empty when the state code is unknown
    pub region: String,

    // Carried through from the export, unused by the engine
    pub product: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub freight: Decimal,
    pub payment_type: String,
    pub installments: Option<u32>,
    pub rating: Option<u8>,
}

impl TransactionRecord {
    /// Minimal constructor for the fields the engine reads.
    /// Region is derived from the state code.
    pub fn new(
        purchase_date: NaiveDate,
        price: Decimal,
        state: &str,
        latitude: f64,
        longitude: f64,
        category: &str,
        seller: &str,
    ) -> Self {
        TransactionRecord {
            purchase_date,
            price,
            state: state.to_string(),
            latitude,
            longitude,
            category: category.to_string(),
            seller: seller.to_string(),
            region: region_for_state(state).unwrap_or_default().to_string(),
            product: String::new(),
            freight: Decimal::ZERO,
            payment_type: String::new(),
            installments: None,
            rating: None,
        }
    }

    pub fn year(&self) -> i32 {
        self.purchase_date.year()
    }

    /// Convert a provider row, rejecting what the engine must never see
    pub fn from_raw(raw: RawSale) -> Result<Self> {
        let purchase_date = NaiveDate::parse_from_str(raw.purchase_date.trim(), PURCHASE_DATE_FORMAT)
            .with_context(|| format!("Invalid purchase date: {:?}", raw.purchase_date))?;

        let price = parse_amount(raw.price).context("Invalid price")?;
        let freight = parse_amount(raw.freight).context("Invalid freight")?;

        let state = raw.state.trim().to_string();
        let region = region_for_state(&state).unwrap_or_default().to_string();

        Ok(TransactionRecord {
            purchase_date,
            price,
            state,
            latitude: raw.lat,
            longitude: raw.lon,
            category: raw.category,
            seller: raw.seller,
            region,
            product: raw.product,
            freight,
            payment_type: raw.payment_type,
            installments: raw.installments,
            rating: raw.rating,
        })
    }
}

fn parse_amount(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        bail!("amount is not a finite number: {}", value);
    }
    if value < 0.0 {
        bail!("amount is negative: {}", value);
    }
    Decimal::try_from(value).map_err(|e| anyhow!("amount {} not representable: {}", value, e))
}

// ============================================================================
// REGIONS
// ============================================================================

/// Region for a Brazilian state code (UF), case-insensitive
pub fn region_for_state(state: &str) -> Option<&'static str> {
    let region = match state.trim().to_uppercase().as_str() {
        "AC" | "AM" | "AP" | "PA" | "RO" | "RR" | "TO" => "Norte",
        "AL" | "BA" | "CE" | "MA" | "PB" | "PE" | "PI" | "RN" | "SE" => "Nordeste",
        "DF" | "GO" | "MS" | "MT" => "Centro-Oeste",
        "ES" | "MG" | "RJ" | "SP" => "Sudeste",
        "PR" | "RS" | "SC" => "Sul",
        _ => return None,
    };
    Some(region)
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// Ordered, read-only collection of records
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<TransactionRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        RecordStore { records }
    }

    /// Parse a JSON array of provider rows
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: Vec<RawSale> = serde_json::from_str(json).context("Failed to parse sales JSON")?;
        Self::from_raw_rows(raw)
    }

    /// Load a JSON export from disk
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sales file: {:?}", path))?;
        let store = Self::from_json_str(&content)?;
        info!(path = ?path, records = store.len(), "loaded sales JSON");
        Ok(store)
    }

    /// Load a CSV export from disk (same column names as the JSON export)
    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path).context("Failed to open CSV file")?;

        let mut raw = Vec::new();
        for (index, result) in rdr.deserialize().enumerate() {
            let row: RawSale =
                result.with_context(|| format!("Failed to deserialize sale at row {}", index + 1))?;
            raw.push(row);
        }

        let store = Self::from_raw_rows(raw)?;
        info!(path = ?path, records = store.len(), "loaded sales CSV");
        Ok(store)
    }

    /// Load by file extension: `.csv` as CSV, anything else as JSON
    pub fn load(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::load_csv(path),
            _ => Self::load_json(path),
        }
    }

    fn from_raw_rows(raw: Vec<RawSale>) -> Result<Self> {
        let mut records = Vec::with_capacity(raw.len());
        for (index, row) in raw.into_iter().enumerate() {
            let record = TransactionRecord::from_raw(row)
                .with_context(|| format!("Rejected sale at row {}", index + 1))?;
            records.push(record);
        }
        debug!(records = records.len(), "converted provider rows");
        Ok(RecordStore { records })
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct sellers in first-seen order
    pub fn sellers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.seller.as_str()))
            .map(|r| r.seller.clone())
            .collect()
    }

    /// Distinct purchase years, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

// ============================================================================
// TESTS
// ============================================================================
