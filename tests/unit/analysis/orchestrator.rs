//! Unit tests for the analysis orchestrator, exercised against in-memory
//! fakes for the store, price source and calendar source.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use equitix::analysis::Analyzer;
use equitix::config::SignalConfig;
use equitix::error::SignalError;
use equitix::models::price::PriceBar;
use equitix::models::signal::{CalendarFlags, SignalLabel, SignalSource};
use equitix::services::market_data::{CalendarSource, PriceSource};
use equitix::store::{MemorySignalStore, Partition, SignalStore, StoreStats};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn make_bars(count: usize, start: f64, step: f64) -> Vec<PriceBar> {
    let first_day = day(2025, 1, 1);
    (0..count)
        .map(|i| {
            let close = start + i as f64 * step;
            PriceBar::new(
                first_day + Duration::days(i as i64),
                close,
                close + 0.5,
                close - 0.5,
                close,
                1_000,
            )
        })
        .collect()
}

#[derive(Default)]
struct FakePriceSource {
    bars: HashMap<String, Vec<PriceBar>>,
    failures: HashSet<String>,
    empty: HashSet<String>,
}

impl FakePriceSource {
    fn with_symbol(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    fn with_failure(mut self, symbol: &str) -> Self {
        self.failures.insert(symbol.to_string());
        self
    }

    fn with_empty(mut self, symbol: &str) -> Self {
        self.empty.insert(symbol.to_string());
        self
    }
}

#[async_trait]
impl PriceSource for FakePriceSource {
    async fn fetch_history(
        &self,
        symbol: &str,
        _range: &str,
    ) -> Result<Vec<PriceBar>, SignalError> {
        if self.failures.contains(symbol) {
            return Err(SignalError::Fetch {
                symbol: symbol.to_string(),
                message: "upstream unavailable".to_string(),
            });
        }
        if self.empty.contains(symbol) {
            return Ok(Vec::new());
        }
        self.bars
            .get(symbol)
            .cloned()
            .ok_or_else(|| SignalError::NoData {
                symbol: symbol.to_string(),
            })
    }
}

struct FakeCalendar {
    flags: CalendarFlags,
    fail: bool,
}

impl FakeCalendar {
    fn quiet() -> Self {
        Self {
            flags: CalendarFlags::default(),
            fail: false,
        }
    }

    fn with_flags(flags: CalendarFlags) -> Self {
        Self { flags, fail: false }
    }

    fn failing() -> Self {
        Self {
            flags: CalendarFlags::default(),
            fail: true,
        }
    }
}

#[async_trait]
impl CalendarSource for FakeCalendar {
    async fn calendar_flags(&self, symbol: &str) -> Result<CalendarFlags, SignalError> {
        if self.fail {
            return Err(SignalError::CalendarLookup {
                symbol: symbol.to_string(),
                message: "lookup unavailable".to_string(),
            });
        }
        Ok(self.flags)
    }
}

/// Store whose writes always fail, for pinning the persistence-failure
/// path: the computed record must still reach the caller.
struct FailingWriteStore {
    inner: MemorySignalStore,
}

#[async_trait]
impl SignalStore for FailingWriteStore {
    async fn get(&self, symbol: &str, date: NaiveDate) -> Option<equitix::models::signal::SignalRecord> {
        self.inner.get(symbol, date).await
    }

    async fn put(&self, _record: &equitix::models::signal::SignalRecord) -> Result<(), SignalError> {
        Err(SignalError::StoreWrite("disk full".to_string()))
    }

    async fn get_many(&self, symbols: &[String], date: NaiveDate) -> Partition {
        self.inner.get_many(symbols, date).await
    }

    async fn purge_older_than(&self, days: i64) -> Result<u64, SignalError> {
        self.inner.purge_older_than(days).await
    }

    async fn stats(&self) -> Result<StoreStats, SignalError> {
        self.inner.stats().await
    }
}

fn analyzer(
    store: Arc<dyn SignalStore>,
    prices: FakePriceSource,
    calendar: FakeCalendar,
) -> Analyzer {
    Analyzer::new(
        store,
        Arc::new(prices),
        Arc::new(calendar),
        SignalConfig::default(),
    )
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn analyze_generates_then_serves_from_cache() {
    let store = Arc::new(MemorySignalStore::new());
    let prices = FakePriceSource::default().with_symbol("AAPL", make_bars(60, 100.0, -0.5));
    let analyzer = analyzer(store, prices, FakeCalendar::quiet());
    let date = Some(day(2025, 6, 2));

    let first = analyzer.analyze(&symbols(&["AAPL"]), date).await;
    assert_eq!(first.cached_count, 0);
    assert_eq!(first.generated_count, 1);
    assert_eq!(first.records[0].source(), Some(SignalSource::Generated));

    let second = analyzer.analyze(&symbols(&["AAPL"]), date).await;
    assert_eq!(second.cached_count, 1);
    assert_eq!(second.generated_count, 0);
    assert_eq!(second.records[0].source(), Some(SignalSource::Database));

    // Idempotence: the cached record carries the same classification
    let a = first.records[0].record().unwrap();
    let b = second.records[0].record().unwrap();
    assert_eq!(a.current_signal, b.current_signal);
    assert_eq!(a.current_rsi, b.current_rsi);
}

#[tokio::test]
async fn per_symbol_failure_does_not_abort_the_batch() {
    let store = Arc::new(MemorySignalStore::new());
    let prices = FakePriceSource::default()
        .with_symbol("AAPL", make_bars(60, 100.0, -0.5))
        .with_failure("BROKEN");
    let analyzer = analyzer(store, prices, FakeCalendar::quiet());

    let report = analyzer
        .analyze(&symbols(&["AAPL", "BROKEN"]), Some(day(2025, 6, 2)))
        .await;

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.generated_count, 1);
    assert_eq!(report.error_count(), 1);

    let error = report
        .records
        .iter()
        .find_map(|e| e.error())
        .expect("failing symbol must produce an error entry");
    assert_eq!(error.symbol, "BROKEN");
    assert!(error.error.contains("BROKEN"));
}

#[tokio::test]
async fn empty_series_surfaces_as_a_no_data_error() {
    let store = Arc::new(MemorySignalStore::new());
    let prices = FakePriceSource::default().with_empty("GHOST");
    let analyzer = analyzer(store, prices, FakeCalendar::quiet());

    let report = analyzer
        .analyze(&symbols(&["GHOST"]), Some(day(2025, 6, 2)))
        .await;

    let error = report.records[0].error().expect("expected an error entry");
    assert!(error.error.contains("no price data"));
}

#[tokio::test]
async fn store_write_failure_still_returns_the_record() {
    // Deliberate degradation: persistence is best-effort, the in-memory
    // result is returned even when the write is dropped.
    let store = Arc::new(FailingWriteStore {
        inner: MemorySignalStore::new(),
    });
    let prices = FakePriceSource::default().with_symbol("AAPL", make_bars(60, 100.0, -0.5));
    let analyzer = analyzer(store, prices, FakeCalendar::quiet());
    let date = Some(day(2025, 6, 2));

    let report = analyzer.analyze(&symbols(&["AAPL"]), date).await;
    assert_eq!(report.generated_count, 1);
    assert!(report.records[0].record().is_some());

    // Nothing was persisted, so a second call generates again
    let again = analyzer.analyze(&symbols(&["AAPL"]), date).await;
    assert_eq!(again.cached_count, 0);
    assert_eq!(again.generated_count, 1);
}

#[tokio::test]
async fn calendar_failure_degrades_to_no_flags() {
    let store = Arc::new(MemorySignalStore::new());
    let prices = FakePriceSource::default().with_symbol("AAPL", make_bars(60, 100.0, 0.1));
    let analyzer = analyzer(store, prices, FakeCalendar::failing());

    let report = analyzer
        .analyze(&symbols(&["AAPL"]), Some(day(2025, 6, 2)))
        .await;

    let record = report.records[0].record().expect("record expected");
    assert_eq!(record.calendar_events, CalendarFlags::default());
    assert!(record.calendar_reasons.is_empty());
}

/// Alternating +1/-1 closes: equal gains and losses pin RSI at exactly 50,
/// so the final bar classifies as HOLD absent a calendar event.
fn alternating_bars(count: usize) -> Vec<PriceBar> {
    let first_day = day(2025, 1, 1);
    (0..count)
        .map(|i| {
            let close = 100.0 + (i % 2) as f64;
            PriceBar::new(
                first_day + Duration::days(i as i64),
                close,
                close + 0.5,
                close - 0.5,
                close,
                1_000,
            )
        })
        .collect()
}

#[tokio::test]
async fn calendar_event_forces_sell_on_the_current_signal() {
    let date = Some(day(2025, 6, 2));

    // Baseline: a neutral series classifies as HOLD
    let quiet = analyzer(
        Arc::new(MemorySignalStore::new()),
        FakePriceSource::default().with_symbol("AAPL", alternating_bars(60)),
        FakeCalendar::quiet(),
    );
    let report = quiet.analyze(&symbols(&["AAPL"]), date).await;
    let record = report.records[0].record().expect("record expected");
    assert_eq!(record.current_signal, SignalLabel::Hold);

    // Same series with an ex-dividend date tomorrow is forced to SELL
    let flags = CalendarFlags {
        ex_dividend_tomorrow: true,
        earnings_tomorrow: false,
    };
    let flagged = analyzer(
        Arc::new(MemorySignalStore::new()),
        FakePriceSource::default().with_symbol("AAPL", alternating_bars(60)),
        FakeCalendar::with_flags(flags),
    );
    let report = flagged.analyze(&symbols(&["AAPL"]), date).await;
    let record = report.records[0].record().expect("record expected");
    assert_eq!(record.current_signal, SignalLabel::Sell);
    assert_eq!(
        record.calendar_reasons,
        vec!["Ex-dividend date tomorrow".to_string()]
    );

    // The override never rewrites history: earlier tail rows keep their
    // original classification
    for row in &record.history[..record.history.len() - 1] {
        assert_eq!(row.signal, SignalLabel::Hold);
    }
}

#[tokio::test]
async fn symbols_are_normalized_and_deduped() {
    let store = Arc::new(MemorySignalStore::new());
    let prices = FakePriceSource::default()
        .with_symbol("AAPL", make_bars(60, 100.0, 0.1))
        .with_symbol("MSFT", make_bars(60, 200.0, 0.1));
    let analyzer = analyzer(store, prices, FakeCalendar::quiet());

    let report = analyzer
        .analyze(
            &symbols(&["aapl", "AAPL", " msft "]),
            Some(day(2025, 6, 2)),
        )
        .await;

    let mut names: Vec<&str> = report
        .records
        .iter()
        .filter_map(|e| e.record())
        .map(|r| r.symbol.as_str())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["AAPL", "MSFT"]);
}

#[tokio::test]
async fn record_fields_are_rounded_for_presentation() {
    let store = Arc::new(MemorySignalStore::new());
    let prices = FakePriceSource::default().with_symbol("AAPL", make_bars(60, 100.123456, 0.333));
    let analyzer = analyzer(store, prices, FakeCalendar::quiet());

    let report = analyzer
        .analyze(&symbols(&["AAPL"]), Some(day(2025, 6, 2)))
        .await;

    let record = report.records[0].record().expect("record expected");
    let price_cents = record.current_price * 100.0;
    assert!((price_cents - price_cents.round()).abs() < 1e-9);
    if let Some(rsi) = record.current_rsi {
        let tenths = rsi * 10.0;
        assert!((tenths - tenths.round()).abs() < 1e-9);
    }
    assert_eq!(record.history.len(), 10);
}

#[tokio::test]
async fn get_cached_record_normalizes_the_symbol() {
    let store = Arc::new(MemorySignalStore::new());
    let prices = FakePriceSource::default().with_symbol("AAPL", make_bars(60, 100.0, 0.1));
    let analyzer = analyzer(store, prices, FakeCalendar::quiet());
    let date = day(2025, 6, 2);

    assert!(analyzer.get_cached_record("aapl", Some(date)).await.is_none());
    analyzer.analyze(&symbols(&["AAPL"]), Some(date)).await;
    let record = analyzer.get_cached_record("aapl", Some(date)).await;
    assert_eq!(record.map(|r| r.symbol), Some("AAPL".to_string()));
}
