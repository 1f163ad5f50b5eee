//! Equitix API Server
//!
//! HTTP API for signal analysis, cache lookups and store maintenance.
//! Falls back to an in-memory store when Postgres is unreachable so that
//! analysis keeps working without persistence.

use dotenvy::dotenv;
use equitix::analysis::Analyzer;
use equitix::config::SignalConfig;
use equitix::core::http::start_server;
use equitix::logging;
use equitix::metrics::Metrics;
use equitix::services::yahoo::YahooFinanceClient;
use equitix::store::{MemorySignalStore, PostgresSignalStore, SignalStore};
use std::env;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let environment = equitix::config::get_environment();
    info!("Starting Equitix API Server");
    info!(environment = %environment, "Environment");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);

    let config = SignalConfig::from_env();
    let metrics = Arc::new(Metrics::new()?);

    info!("Connecting to signal store...");
    let store: Arc<dyn SignalStore> = match PostgresSignalStore::connect().await {
        Ok(store) => {
            info!("Postgres signal store connected");
            metrics.store_connected.set(1.0);
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "Postgres unavailable, using in-memory store (no persistence)");
            metrics.store_connected.set(0.0);
            Arc::new(MemorySignalStore::new())
        }
    };

    let market_data = Arc::new(YahooFinanceClient::new(&config));
    let analyzer = Arc::new(
        Analyzer::new(store, market_data.clone(), market_data, config).with_metrics(metrics.clone()),
    );

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, analyzer, metrics).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
