//! Analysis orchestrator: cache-first signal retrieval.
//!
//! For a requested symbol set the orchestrator partitions into cached and
//! missing via the store, computes the missing entries through the
//! indicator engine and classifier, persists them, and returns a unified
//! source-tagged result set. Per-symbol failures become explicit error
//! entries; they never abort the batch.

use chrono::{NaiveDate, Utc};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SignalConfig;
use crate::error::SignalError;
use crate::indicators;
use crate::metrics::Metrics;
use crate::models::signal::{
    AnalysisEntry, AnalysisReport, CalendarFlags, ErrorEntry, HistoryRow, SignalRecord,
    SignalSource,
};
use crate::services::market_data::{CalendarSource, PriceSource};
use crate::signals::classifier;
use crate::store::{SignalStore, StoreStats};

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Uppercase-normalize and dedupe a symbol list, preserving input order.
fn normalize_symbols(symbols: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for symbol in symbols {
        let upper = symbol.trim().to_uppercase();
        if !upper.is_empty() && !seen.contains(&upper) {
            seen.push(upper);
        }
    }
    seen
}

/// Dependency-injected orchestrator, constructed once per process and
/// shared by reference. Holds no state beyond its collaborators, so
/// concurrent analysis requests only share the store.
pub struct Analyzer {
    store: Arc<dyn SignalStore>,
    prices: Arc<dyn PriceSource>,
    calendar: Arc<dyn CalendarSource>,
    config: SignalConfig,
    metrics: Option<Arc<Metrics>>,
}

impl Analyzer {
    pub fn new(
        store: Arc<dyn SignalStore>,
        prices: Arc<dyn PriceSource>,
        calendar: Arc<dyn CalendarSource>,
        config: SignalConfig,
    ) -> Self {
        Self {
            store,
            prices,
            calendar,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Analyze a symbol set for one calendar day (today when omitted).
    ///
    /// Cached records are tagged `database`, freshly computed ones
    /// `generated`. Symbols have no ordering dependency between each
    /// other, so missing entries are computed concurrently, bounded by
    /// `fetch_concurrency`.
    pub async fn analyze(&self, symbols: &[String], date: Option<NaiveDate>) -> AnalysisReport {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let symbols = normalize_symbols(symbols);

        let partition = self.store.get_many(&symbols, date).await;

        if let Some(ref metrics) = self.metrics {
            metrics.analyses_total.inc();
            metrics.cache_hits_total.inc_by(partition.cached.len() as u64);
            metrics.cache_misses_total.inc_by(partition.missing.len() as u64);
        }

        debug!(
            requested = symbols.len(),
            cached = partition.cached.len(),
            missing = partition.missing.len(),
            %date,
            "partitioned symbol set"
        );

        let cached_count = partition.cached.len();
        let mut records: Vec<AnalysisEntry> = partition
            .cached
            .into_iter()
            .map(|record| AnalysisEntry::Record {
                record,
                source: SignalSource::Database,
            })
            .collect();

        let generated: Vec<AnalysisEntry> = stream::iter(partition.missing)
            .map(|symbol| self.generate_entry(symbol, date))
            .buffer_unordered(self.config.fetch_concurrency.max(1))
            .collect()
            .await;

        let generated_count = generated.iter().filter(|e| e.record().is_some()).count();
        records.extend(generated);

        info!(
            total = records.len(),
            cached = cached_count,
            generated = generated_count,
            "analysis complete"
        );

        AnalysisReport {
            records,
            cached_count,
            generated_count,
        }
    }

    /// Raw cached record lookup; `None` covers absence and degraded reads.
    pub async fn get_cached_record(
        &self,
        symbol: &str,
        date: Option<NaiveDate>,
    ) -> Option<SignalRecord> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let symbol = symbol.trim().to_uppercase();
        self.store.get(&symbol, date).await
    }

    pub async fn purge_older_than(&self, days: i64) -> Result<u64, SignalError> {
        self.store.purge_older_than(days).await
    }

    pub async fn stats(&self) -> Result<StoreStats, SignalError> {
        self.store.stats().await
    }

    async fn generate_entry(&self, symbol: String, date: NaiveDate) -> AnalysisEntry {
        match self.compute_record(&symbol, date).await {
            Ok(record) => {
                if let Err(e) = self.store.put(&record).await {
                    // Persistence failure drops the write; the computed
                    // record is still returned to the caller.
                    warn!(symbol = %record.symbol, error = %e, "failed to persist record, returning unpersisted result");
                }
                if let Some(ref metrics) = self.metrics {
                    metrics.records_generated_total.inc();
                }
                AnalysisEntry::Record {
                    record,
                    source: SignalSource::Generated,
                }
            }
            Err(e) => {
                if let Some(ref metrics) = self.metrics {
                    metrics.fetch_failures_total.inc();
                }
                warn!(symbol = %symbol, error = %e, "symbol analysis failed");
                AnalysisEntry::Error(ErrorEntry {
                    symbol,
                    error: e.to_string(),
                })
            }
        }
    }

    async fn compute_record(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<SignalRecord, SignalError> {
        let bars = self
            .prices
            .fetch_history(symbol, &self.config.default_range)
            .await?;

        if bars.is_empty() {
            return Err(SignalError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let series = indicators::compute(&bars, &self.config);
        let mut labels = classifier::label_series(&series, &self.config);

        let flags = match self.calendar.calendar_flags(symbol).await {
            Ok(flags) => flags,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "calendar lookup failed, assuming no events");
                CalendarFlags::default()
            }
        };
        classifier::apply_calendar_override(&mut labels, &flags);

        let cfg = &self.config;
        let last = bars.len() - 1;
        let current_rsi = series.rsi[last];
        let current_macd = series.macd.macd[last];
        let current_macd_signal = series.macd.signal[last];
        let current_macd_histogram = series.macd.histogram[last];

        let (recent_buys, recent_sells) =
            classifier::recent_counts(&labels, cfg.recent_window_days);

        let tail_start = bars.len().saturating_sub(cfg.display_tail_rows);
        let history: Vec<HistoryRow> = (tail_start..bars.len())
            .map(|i| HistoryRow {
                date: bars[i].date,
                close: round_to(bars[i].close, cfg.price_decimal_places),
                rsi: series.rsi[i].map(|r| round_to(r, 1)),
                macd: round_to(series.macd.macd[i], cfg.macd_decimal_places),
                macd_signal: round_to(series.macd.signal[i], cfg.macd_decimal_places),
                macd_histogram: round_to(series.macd.histogram[i], cfg.macd_decimal_places),
                signal: labels[i],
            })
            .collect();

        Ok(SignalRecord {
            symbol: symbol.to_string(),
            date,
            current_price: round_to(bars[last].close, cfg.price_decimal_places),
            current_rsi: current_rsi.map(|r| round_to(r, 1)),
            current_signal: labels[last],
            signal_strength: classifier::strength(current_rsi, cfg),
            current_macd: round_to(current_macd, cfg.macd_decimal_places),
            current_macd_signal: round_to(current_macd_signal, cfg.macd_decimal_places),
            current_macd_histogram: round_to(current_macd_histogram, cfg.macd_decimal_places),
            macd_position: classifier::macd_position(current_macd, current_macd_signal),
            recent_buy_signals: recent_buys,
            recent_sell_signals: recent_sells,
            calendar_events: flags,
            calendar_reasons: classifier::calendar_reasons(&flags),
            generated_at: Utc::now(),
            history,
        })
    }
}
