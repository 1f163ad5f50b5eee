//! Yahoo Finance client for historical bars and calendar events.
//!
//! Uses the unofficial chart (v8) and quoteSummary (v10) endpoints.
//! Transient failures are retried with a fixed backoff; an unknown symbol
//! or empty series is non-retryable and surfaces as `NoData`.

use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{self, SignalConfig};
use crate::error::SignalError;
use crate::models::price::PriceBar;
use crate::models::signal::CalendarFlags;
use crate::services::market_data::{CalendarSource, PriceSource};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    calendar_events: Option<CalendarEvents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEvents {
    ex_dividend_date: Option<RawDate>,
    earnings: Option<Earnings>,
}

#[derive(Debug, Deserialize)]
struct RawDate {
    raw: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Earnings {
    #[serde(default)]
    earnings_date: Vec<RawDate>,
}

/// Yahoo uses hyphens instead of dots for share classes (BRK-B, not BRK.B).
fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

fn epoch_to_date(secs: i64) -> Option<chrono::NaiveDate> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    http: Client,
    base_url: String,
    retry_attempts: usize,
    retry_delay: Duration,
}

impl YahooFinanceClient {
    pub fn new(config: &SignalConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config::get_market_data_url(),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Point the client at a different base URL (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the fixed backoff between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn fetch_history_once(
        &self,
        symbol: &str,
        range: &str,
    ) -> Result<Vec<PriceBar>, SignalError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d&includePrePost=false",
            self.base_url, symbol, range
        );
        debug!(symbol = %symbol, range = %range, "fetching price history");

        let response = self.http.get(&url).send().await.map_err(|e| SignalError::Fetch {
            symbol: symbol.to_string(),
            message: format!("request failed: {}", e),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SignalError::NoData {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SignalError::Fetch {
                symbol: symbol.to_string(),
                message: format!("upstream status {}", status),
            });
        }

        let data: ChartResponse = response.json().await.map_err(|e| SignalError::Fetch {
            symbol: symbol.to_string(),
            message: format!("parse error: {}", e),
        })?;

        if let Some(error) = data.chart.error {
            debug!(symbol = %symbol, code = %error.code, description = %error.description, "chart API error");
            return Err(SignalError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let result = data
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| SignalError::NoData {
                symbol: symbol.to_string(),
            })?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| SignalError::NoData {
                symbol: symbol.to_string(),
            })?;

        let opens = quote.open.unwrap_or_default();
        let highs = quote.high.unwrap_or_default();
        let lows = quote.low.unwrap_or_default();
        let closes = quote.close.unwrap_or_default();
        let volumes = quote.volume.unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            // Rows without a close (holidays, in-progress sessions) are dropped
            let close = match closes.get(i).copied().flatten() {
                Some(c) if c > 0.0 => c,
                _ => continue,
            };
            let Some(date) = epoch_to_date(ts) else {
                continue;
            };

            bars.push(PriceBar {
                date,
                open: opens.get(i).copied().flatten().unwrap_or(close),
                high: highs.get(i).copied().flatten().unwrap_or(close),
                low: lows.get(i).copied().flatten().unwrap_or(close),
                close,
                volume: volumes.get(i).copied().flatten().unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(SignalError::NoData {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        range: &str,
    ) -> Result<Vec<PriceBar>, SignalError> {
        let yahoo_symbol = normalize_symbol(symbol);

        (|| self.fetch_history_once(&yahoo_symbol, range))
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.retry_delay)
                    .with_max_times(self.retry_attempts - 1),
            )
            .when(SignalError::is_retryable)
            .notify(|err: &SignalError, dur: Duration| {
                warn!(error = %err, delay_ms = dur.as_millis() as u64, "retrying price fetch");
            })
            .await
    }
}

#[async_trait]
impl CalendarSource for YahooFinanceClient {
    async fn calendar_flags(&self, symbol: &str) -> Result<CalendarFlags, SignalError> {
        let yahoo_symbol = normalize_symbol(symbol);
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=calendarEvents",
            self.base_url, yahoo_symbol
        );
        debug!(symbol = %yahoo_symbol, "fetching calendar events");

        let lookup_err = |message: String| SignalError::CalendarLookup {
            symbol: yahoo_symbol.clone(),
            message,
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| lookup_err(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(lookup_err(format!("upstream status {}", response.status())));
        }

        let data: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| lookup_err(format!("parse error: {}", e)))?;

        let events = data
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .and_then(|r| r.calendar_events);

        let Some(events) = events else {
            return Ok(CalendarFlags::default());
        };

        let tomorrow = Utc::now().date_naive() + ChronoDuration::days(1);

        let ex_dividend_tomorrow = events
            .ex_dividend_date
            .and_then(|d| d.raw)
            .and_then(epoch_to_date)
            .map(|d| d == tomorrow)
            .unwrap_or(false);

        let earnings_tomorrow = events
            .earnings
            .map(|e| {
                e.earnings_date
                    .iter()
                    .filter_map(|d| d.raw)
                    .filter_map(epoch_to_date)
                    .any(|d| d == tomorrow)
            })
            .unwrap_or(false);

        Ok(CalendarFlags {
            ex_dividend_tomorrow,
            earnings_tomorrow,
        })
    }
}
