//! Equitix Worker
//!
//! Runs the scheduled batch scans that keep the signal cache warm: an
//! hourly scan over the portfolio and scan-list symbols, a daily retention
//! purge, and periodic health checks. Pass `--once` to run a single scan
//! and exit.

use dotenvy::dotenv;
use equitix::analysis::Analyzer;
use equitix::config::SignalConfig;
use equitix::core::scheduler::ScanScheduler;
use equitix::logging;
use equitix::metrics::Metrics;
use equitix::services::portfolio;
use equitix::services::yahoo::YahooFinanceClient;
use equitix::store::{PostgresSignalStore, SignalStore};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    let environment = equitix::config::get_environment();
    info!("Starting Equitix Worker");
    info!(environment = %environment, "Environment");

    let config = SignalConfig::from_env();
    let metrics = Arc::new(Metrics::new()?);

    // The worker exists to prewarm the persistent cache; without a durable
    // store there is nothing useful for it to do.
    info!("Connecting to signal store...");
    let store: Arc<dyn SignalStore> = match PostgresSignalStore::connect().await {
        Ok(store) => {
            info!("Postgres signal store connected");
            metrics.store_connected.set(1.0);
            Arc::new(store)
        }
        Err(e) => {
            return Err(format!("worker requires the signal store: {}", e).into());
        }
    };

    let mut symbols = portfolio::load_portfolio(Path::new(portfolio::PORTFOLIO_FILE));
    let scan_list = portfolio::load_scan_list(Path::new(portfolio::SCAN_LIST_FILE), &symbols);
    symbols.extend(scan_list);

    if symbols.is_empty() {
        warn!("no symbols to scan; add entries to my_portfolio.txt or scan_list.txt");
    } else {
        info!(count = symbols.len(), "symbols to scan: {}", symbols.join(", "));
    }

    let market_data = Arc::new(YahooFinanceClient::new(&config));
    let retention_days = config.retention_days;
    let analyzer = Arc::new(
        Analyzer::new(store, market_data.clone(), market_data, config).with_metrics(metrics.clone()),
    );

    let scheduler = Arc::new(ScanScheduler::new(
        analyzer,
        symbols,
        retention_days,
        Some(metrics.clone()),
    )?);

    if std::env::args().any(|a| a == "--once") {
        info!("Running single signal scan...");
        scheduler.run_scan_once().await;
        info!("Single scan completed");
        return Ok(());
    }

    if !scheduler.run_health_check().await {
        return Err("initial health check failed".into());
    }

    scheduler.start().await;

    info!("Worker started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down worker...");
            scheduler.stop().await;
            info!("Worker stopped");
        }
    }

    Ok(())
}
