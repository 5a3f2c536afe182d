//! xstock - builds the categorized stock report.
//!
//! Loads the security listing, builds every security, classifies the
//! results and writes one report file per configured format.

use anyhow::{Context, Result};
use std::sync::Arc;
use xstock::data::{DataSources, EniuAdapter, SnapshotStore};
use xstock::{ReportClassifier, ReportFormat, StockAggregator, StockReport};
use xstock_common::config::{config_path, Config, PriceSource};
use xstock_common::logging::init_logging_with_exclusions;

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = std::time::Instant::now();

    // Load configuration
    let config = Config::load_with_env()?;
    config.validate().context("Invalid configuration")?;

    // Initialize logging
    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    tracing::info!("xstock v{}", env!("CARGO_PKG_VERSION"));
    let path = config_path();
    if path.exists() {
        tracing::info!(path = %path.display(), "Config loaded");
    } else {
        tracing::info!("Config file not found, using defaults");
    }

    let store = Arc::new(SnapshotStore::new(&config.data.snapshot_dir));
    let mut sources = DataSources::uniform(Arc::clone(&store));
    if config.data.price_source == PriceSource::Eniu {
        sources = sources.with_price_history(Arc::new(EniuAdapter::from_config(&config.data)));
    }
    tracing::info!(
        snapshot_dir = %store.dir().display(),
        price_source = ?config.data.price_source,
        "Data sources ready"
    );

    let mut identities = store
        .list_securities()
        .await
        .context("Failed to load security listing")?;
    if !config.report.securities.is_empty() {
        identities.retain(|s| config.report.securities.contains(&s.secucode));
    }

    let aggregator = Arc::new(StockAggregator::from_config(sources, &config.report));
    let mut outcome = aggregator
        .build_all(identities, config.report.concurrency)
        .await;
    outcome.stocks.sort_by_roe();

    let classifier = ReportClassifier::new(config.report.thresholds);
    let report = StockReport::new(&outcome, classifier, chrono::Local::now().date_naive());

    for name in &config.report.formats {
        let format: ReportFormat = name.parse().map_err(anyhow::Error::msg)?;
        let path = report.save_to_dir(&config.report.output_dir, format)?;
        tracing::info!(format = %format, path = %path.display(), "Report written");
    }

    tracing::info!(
        built = outcome.stocks.len(),
        failed = outcome.failures.len(),
        duration_ms = startup_start.elapsed().as_millis() as u64,
        "Report run complete"
    );

    Ok(())
}
