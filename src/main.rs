use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sales_dashboard::{
    DashboardConfig, DashboardEngine, DashboardSnapshot, FilterCriteria, RecordStore,
};

const USAGE: &str = "Usage: sales-dashboard <records.json|records.csv> \
[--region R] [--year Y] [--seller S]... [--top N] [--config FILE] [--json]";

/// Command-line selection, mirrors the dashboard sidebar
#[derive(Debug, Default)]
struct Args {
    records: PathBuf,
    region: Option<String>,
    year: Option<i32>,
    sellers: Vec<String>,
    top: Option<usize>,
    config: Option<PathBuf>,
    json: bool,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut records = None;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--region" => args.region = Some(value(&mut argv, "--region")?),
            "--year" => {
                let raw = value(&mut argv, "--year")?;
                args.year = Some(raw.parse().with_context(|| format!("Invalid year: {}", raw))?);
            }
            "--seller" => args.sellers.push(value(&mut argv, "--seller")?),
            "--top" => {
                let raw = value(&mut argv, "--top")?;
                args.top = Some(raw.parse().with_context(|| format!("Invalid top: {}", raw))?);
            }
            "--config" => args.config = Some(PathBuf::from(value(&mut argv, "--config")?)),
            "--json" => args.json = true,
            "-h" | "--help" => bail!("{}", USAGE),
            other if other.starts_with("--") => bail!("Unknown option {}\n{}", other, USAGE),
            other => records = Some(PathBuf::from(other)),
        }
    }

    args.records = records.with_context(|| USAGE.to_string())?;
    Ok(args)
}

fn value(argv: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    argv.next().with_context(|| format!("{} needs a value", flag))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };

    let store = RecordStore::load(&args.records)?;
    let criteria = FilterCriteria::from_selection(
        &config,
        &store,
        args.region.as_deref(),
        args.year,
        &args.sellers,
    )?;

    let engine = DashboardEngine::new(config);
    let snapshot = engine.snapshot(store.records(), &criteria, args.top)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_report(&snapshot);
    }

    Ok(())
}

fn print_report(snapshot: &DashboardSnapshot) {
    println!("📊 Sales Dashboard");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Revenue:  {}", snapshot.total_revenue_display);
    println!("Sales:    {}", snapshot.total_sales_display);

    if snapshot.is_empty() {
        println!("\nNo sales match this selection.");
        return;
    }

    println!("\n🗺️  Top states (revenue)");
    for row in &snapshot.top_states_by_revenue.rows {
        println!("  {:<6} {:>14.2}  ({} sales)", row.state, row.sum, row.count);
    }

    println!("\n🗺️  Top states (sales)");
    for row in &snapshot.top_states_by_sales.rows {
        println!("  {:<6} {:>8}", row.state, row.count);
    }

    println!("\n📅 Monthly");
    for row in &snapshot.monthly.rows {
        println!("  {:<16} {:>14.2}  ({} sales)", row.key.label(), row.sum, row.count);
    }

    println!("\n🏷️  Categories (revenue)");
    for row in &snapshot.revenue_by_category.rows {
        println!("  {:<24} {:>14.2}", row.key.label(), row.sum);
    }

    println!("\n🏷️  Categories (sales)");
    for row in &snapshot.sales_by_category.rows {
        println!("  {:<24} {:>8}", row.key.label(), row.count);
    }

    println!("\n🏆 Top sellers (revenue)");
    for row in &snapshot.top_sellers_by_revenue.rows {
        println!("  {:<24} {:>14.2}", row.key.label(), row.sum);
    }

    println!("\n🏆 Top sellers (sales)");
    for row in &snapshot.top_sellers_by_sales.rows {
        println!("  {:<24} {:>8}", row.key.label(), row.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> impl Iterator<Item = String> {
        args.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_full_selection() {
        let args = parse_args(argv(&[
            "sales.json", "--region", "Sul", "--year", "2022", "--seller", "Ana", "--seller",
            "Bruno", "--top", "3", "--json",
        ]))
        .unwrap();

        assert_eq!(args.records, PathBuf::from("sales.json"));
        assert_eq!(args.region.as_deref(), Some("Sul"));
        assert_eq!(args.year, Some(2022));
        assert_eq!(args.sellers, vec!["Ana", "Bruno"]);
        assert_eq!(args.top, Some(3));
        assert!(args.json);
    }

    #[test]
    fn test_parse_requires_records_path() {
        assert!(parse_args(argv(&["--year", "2021"])).is_err());
        assert!(parse_args(argv(&["sales.json", "--year"])).is_err());
        assert!(parse_args(argv(&["sales.json", "--year", "soon"])).is_err());
        assert!(parse_args(argv(&["sales.json", "--bogus"])).is_err());
    }
}
