// 🔢 Metric Formatter - units → thousand → million

use crate::config::DashboardConfig;
use rust_decimal::Decimal;

pub const DEFAULT_DECIMALS: usize = 3;
pub const DEFAULT_UNITS: [&str; 3] = ["units", "thousand", "million"];

/// Scales a total into a readable magnitude with fixed decimals
#[derive(Debug, Clone, PartialEq)]
pub struct MagnitudeFormatter {
    pub decimals: usize,
    /// Ordered unit labels, each 1000x the previous. Must not be empty.
    pub units: Vec<String>,
}

impl Default for MagnitudeFormatter {
    fn default() -> Self {
        MagnitudeFormatter {
            decimals: DEFAULT_DECIMALS,
            units: DEFAULT_UNITS.iter().map(|u| u.to_string()).collect(),
        }
    }
}

impl MagnitudeFormatter {
    pub fn from_config(config: &DashboardConfig) -> Self {
        MagnitudeFormatter {
            decimals: config.decimals,
            ..Default::default()
        }
    }

    fn last_unit(&self) -> usize {
        self.units.len().saturating_sub(1)
    }

    fn label(&self, unit: usize) -> &str {
        self.units.get(unit).map(String::as_str).unwrap_or("")
    }

    /// Scaled value and the index of its unit label. Escalation looks at the
    /// value as it will be printed, so 999.9996 becomes 1.000 thousand.
    pub fn scale(&self, value: f64) -> (f64, usize) {
        let factor = 10f64.powi(self.decimals as i32);
        let mut scaled = value;
        let mut unit = 0;
        while (scaled * factor).round() / factor >= 1000.0 && unit < self.last_unit() {
            scaled /= 1000.0;
            unit += 1;
        }
        (scaled, unit)
    }

    /// Exact counterpart of `scale` for money totals
    pub fn scale_decimal(&self, value: Decimal) -> (Decimal, usize) {
        let thousand = Decimal::from(1000);
        let mut scaled = value;
        let mut unit = 0;
        while scaled.round_dp(self.decimals as u32) >= thousand && unit < self.last_unit() {
            scaled /= thousand;
            unit += 1;
        }
        (scaled.round_dp(self.decimals as u32), unit)
    }

    pub fn format(&self, value: f64, prefix: &str) -> String {
        let (scaled, unit) = self.scale(value);
        let number = format!("{:.*}", self.decimals, scaled);
        join(prefix, &number, self.label(unit))
    }

    pub fn format_decimal(&self, value: Decimal, prefix: &str) -> String {
        let (scaled, unit) = self.scale_decimal(value);
        let number = format!("{:.*}", self.decimals, scaled);
        join(prefix, &number, self.label(unit))
    }
}

fn join(prefix: &str, number: &str, label: &str) -> String {
    if prefix.is_empty() {
        format!("{} {}", number, label)
    } else {
        format!("{} {} {}", prefix, number, label)
    }
}

/// Format with the default decimals and units
pub fn format_magnitude(value: f64, prefix: &str) -> String {
    MagnitudeFormatter::default().format(value, prefix)
}
