//! One-shot portfolio analysis from the command line.
//!
//! Analyzes the configured portfolio, prints the current signal table and
//! exits. Uses the persistent store when reachable so repeated runs on the
//! same day are served from cache.

use dotenvy::dotenv;
use equitix::analysis::Analyzer;
use equitix::config::SignalConfig;
use equitix::logging;
use equitix::models::signal::{AnalysisEntry, SignalStrength};
use equitix::services::portfolio;
use equitix::services::yahoo::YahooFinanceClient;
use equitix::store::{MemorySignalStore, PostgresSignalStore, SignalStore};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let config = SignalConfig::from_env();

    println!("{}", "=".repeat(70));
    println!("EQUITIX - RSI/MACD Stock Signal Generator");
    println!("{}", "=".repeat(70));
    println!("RSI Period: {}", config.rsi_period);
    println!("RSI Oversold Threshold: {}", config.oversold_threshold);
    println!("RSI Overbought Threshold: {}", config.overbought_threshold);
    println!("Analysis Range: {}", config.default_range);
    println!("{}", "=".repeat(70));

    let store: Arc<dyn SignalStore> = match PostgresSignalStore::connect().await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "Postgres unavailable, results will not be cached");
            Arc::new(MemorySignalStore::new())
        }
    };

    let market_data = Arc::new(YahooFinanceClient::new(&config));
    let analyzer = Analyzer::new(store, market_data.clone(), market_data, config);

    let symbols = portfolio::load_portfolio(Path::new(portfolio::PORTFOLIO_FILE));
    println!("\nANALYZING {} STOCKS...\n", symbols.len());

    let report = analyzer.analyze(&symbols, None).await;

    println!("CURRENT SIGNALS:");
    println!("{}", "-".repeat(120));
    println!(
        "{:<8} {:<10} {:<8} {:<12} {:<10} {:<30} {:<8} {:<9} {:<15}",
        "Symbol", "Price", "RSI", "Signal", "MACD", "Position", "Buy/30d", "Sell/30d", "Calendar"
    );
    println!("{}", "-".repeat(120));

    for entry in &report.records {
        match entry {
            AnalysisEntry::Record { record: r, .. } => {
                let strength = if r.signal_strength == SignalStrength::Strong {
                    "*"
                } else {
                    " "
                };
                let rsi = r
                    .current_rsi
                    .map(|v| format!("{:.1}", v))
                    .unwrap_or_else(|| "-".to_string());
                let calendar = if r.calendar_reasons.is_empty() {
                    "-".to_string()
                } else {
                    r.calendar_reasons.join(", ")
                };
                println!(
                    "{:<8} ${:<9.2} {:<8} {}{:<11} {:<10.4} {:<30} {:<8} {:<9} {:<15}",
                    r.symbol,
                    r.current_price,
                    rsi,
                    strength,
                    r.current_signal.as_str(),
                    r.current_macd,
                    r.macd_position.describe(),
                    r.recent_buy_signals,
                    r.recent_sell_signals,
                    calendar
                );
            }
            AnalysisEntry::Error(e) => {
                println!("{:<8} {}", e.symbol, e.error);
            }
        }
    }

    println!("{}", "-".repeat(120));
    println!(
        "\n{} cached, {} generated, {} errors",
        report.cached_count,
        report.generated_count,
        report.error_count()
    );
    println!("\nLegend:");
    println!("  BUY         - RSI <= oversold threshold or bullish MACD crossover");
    println!("  SELL        - RSI >= overbought threshold or bearish MACD crossover");
    println!("  STRONG_BUY  - oversold RSI confirmed by a bullish MACD crossover");
    println!("  STRONG_SELL - overbought RSI confirmed by a bearish MACD crossover");
    println!("  HOLD        - no active condition");
    println!("  *           - strength STRONG (RSI beyond the strict thresholds)");
    println!("  Calendar    - upcoming ex-dividend or earnings events force SELL");
    println!("\nDisclaimer: educational purposes only. Not financial advice.");

    Ok(())
}
