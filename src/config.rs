//! Environment configuration and signal tuning parameters

use serde::{Deserialize, Serialize};
use std::env;

/// Current runtime environment ("production", "development", ...)
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
}

/// Postgres connection string for the signal cache store
pub fn get_database_url() -> String {
    env::var("DATABASE_URL")
        .unwrap_or_else(|_| "host=localhost user=postgres dbname=equitix".to_string())
}

/// Base URL of the market data API (overridable for testing)
pub fn get_market_data_url() -> String {
    env::var("MARKET_DATA_URL")
        .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Tuning parameters for indicator math, classification, caching and the
/// upstream fetch client. Every field can be overridden from the
/// environment; defaults match the classic 14/30/70 RSI and 12/26/9 MACD
/// setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalConfig {
    pub rsi_period: usize,
    pub oversold_threshold: f64,
    pub overbought_threshold: f64,
    pub strong_buy_threshold: f64,
    pub strong_sell_threshold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Trailing window (in bars) for recent buy/sell signal counting
    pub recent_window_days: usize,
    /// Number of historical rows carried on each record for display
    pub display_tail_rows: usize,
    /// Records older than this many days are removed by the retention sweep
    pub retention_days: i64,
    pub request_timeout_seconds: u64,
    pub retry_attempts: usize,
    /// Upper bound on concurrent per-symbol fetch+compute tasks
    pub fetch_concurrency: usize,
    /// History range requested from the price source ("1y", "6mo", ...)
    pub default_range: String,
    pub macd_decimal_places: u32,
    pub price_decimal_places: u32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            oversold_threshold: 30.0,
            overbought_threshold: 70.0,
            strong_buy_threshold: 20.0,
            strong_sell_threshold: 80.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            recent_window_days: 30,
            display_tail_rows: 10,
            retention_days: 30,
            request_timeout_seconds: 30,
            retry_attempts: 3,
            fetch_concurrency: 4,
            default_range: "1y".to_string(),
            macd_decimal_places: 4,
            price_decimal_places: 2,
        }
    }
}

impl SignalConfig {
    /// Build a config from environment overrides on top of the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rsi_period: env_parse("RSI_PERIOD", defaults.rsi_period),
            oversold_threshold: env_parse("OVERSOLD_THRESHOLD", defaults.oversold_threshold),
            overbought_threshold: env_parse("OVERBOUGHT_THRESHOLD", defaults.overbought_threshold),
            strong_buy_threshold: env_parse("STRONG_BUY_THRESHOLD", defaults.strong_buy_threshold),
            strong_sell_threshold: env_parse("STRONG_SELL_THRESHOLD", defaults.strong_sell_threshold),
            macd_fast: env_parse("MACD_FAST_PERIOD", defaults.macd_fast),
            macd_slow: env_parse("MACD_SLOW_PERIOD", defaults.macd_slow),
            macd_signal: env_parse("MACD_SIGNAL_PERIOD", defaults.macd_signal),
            recent_window_days: env_parse("RECENT_WINDOW_DAYS", defaults.recent_window_days),
            display_tail_rows: env_parse("DISPLAY_TAIL_ROWS", defaults.display_tail_rows),
            retention_days: env_parse("RETENTION_DAYS", defaults.retention_days),
            request_timeout_seconds: env_parse(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
            retry_attempts: env_parse("RETRY_ATTEMPTS", defaults.retry_attempts),
            fetch_concurrency: env_parse("FETCH_CONCURRENCY", defaults.fetch_concurrency),
            default_range: env::var("DEFAULT_RANGE").unwrap_or(defaults.default_range),
            macd_decimal_places: env_parse("MACD_DECIMAL_PLACES", defaults.macd_decimal_places),
            price_decimal_places: env_parse("PRICE_DECIMAL_PLACES", defaults.price_decimal_places),
        }
    }
}
