//! Unit tests for the in-memory signal store

use chrono::{Duration, NaiveDate, Utc};
use equitix::models::signal::{
    CalendarFlags, MacdPosition, SignalLabel, SignalRecord, SignalStrength,
};
use equitix::store::{MemorySignalStore, SignalStore};

fn sample_record(symbol: &str, date: NaiveDate) -> SignalRecord {
    SignalRecord {
        symbol: symbol.to_string(),
        date,
        current_price: 123.45,
        current_rsi: Some(42.0),
        current_signal: SignalLabel::Hold,
        signal_strength: SignalStrength::Normal,
        current_macd: 0.1,
        current_macd_signal: 0.05,
        current_macd_histogram: 0.05,
        macd_position: MacdPosition::Mixed,
        recent_buy_signals: 1,
        recent_sell_signals: 2,
        calendar_events: CalendarFlags::default(),
        calendar_reasons: Vec::new(),
        generated_at: Utc::now(),
        history: Vec::new(),
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn get_returns_none_for_absent_keys() {
    let store = MemorySignalStore::new();
    assert!(store.get("AAPL", day(2025, 6, 2)).await.is_none());
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let store = MemorySignalStore::new();
    let record = sample_record("AAPL", day(2025, 6, 2));
    store.put(&record).await.unwrap();

    let loaded = store.get("AAPL", day(2025, 6, 2)).await.unwrap();
    assert_eq!(loaded.symbol, "AAPL");
    assert_eq!(loaded.current_price, 123.45);

    // Same symbol on a different day is a distinct key
    assert!(store.get("AAPL", day(2025, 6, 3)).await.is_none());
}

#[tokio::test]
async fn put_replaces_wholesale() {
    let store = MemorySignalStore::new();
    let date = day(2025, 6, 2);
    store.put(&sample_record("AAPL", date)).await.unwrap();

    let mut updated = sample_record("AAPL", date);
    updated.current_signal = SignalLabel::Buy;
    updated.current_price = 99.0;
    store.put(&updated).await.unwrap();

    let loaded = store.get("AAPL", date).await.unwrap();
    assert_eq!(loaded.current_signal, SignalLabel::Buy);
    assert_eq!(loaded.current_price, 99.0);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_records, 1, "upsert must not duplicate the key");
}

#[tokio::test]
async fn get_many_partitions_without_overlap_or_omission() {
    let store = MemorySignalStore::new();
    let date = day(2025, 6, 2);
    store.put(&sample_record("MSFT", date)).await.unwrap();
    store.put(&sample_record("V", date)).await.unwrap();

    let requested: Vec<String> = ["AAPL", "MSFT", "TSLA", "V"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let partition = store.get_many(&requested, date).await;

    let cached: Vec<&str> = partition.cached.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(cached, vec!["MSFT", "V"], "input order preserved");
    assert_eq!(partition.missing, vec!["AAPL", "TSLA"]);

    // Union equals the request, no symbol in both sides
    let mut all: Vec<&str> = cached
        .iter()
        .copied()
        .chain(partition.missing.iter().map(|s| s.as_str()))
        .collect();
    all.sort_unstable();
    let mut expected: Vec<&str> = requested.iter().map(|s| s.as_str()).collect();
    expected.sort_unstable();
    assert_eq!(all, expected);
}

#[tokio::test]
async fn purge_deletes_only_records_past_retention() {
    let store = MemorySignalStore::new();
    let today = Utc::now().date_naive();
    store.put(&sample_record("AAPL", today)).await.unwrap();
    store
        .put(&sample_record("MSFT", today - Duration::days(45)))
        .await
        .unwrap();

    let deleted = store.purge_older_than(30).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(store.get("AAPL", today).await.is_some());
    assert!(store
        .get("MSFT", today - Duration::days(45))
        .await
        .is_none());
}

#[tokio::test]
async fn stats_count_records_symbols_and_today() {
    let store = MemorySignalStore::new();
    let today = Utc::now().date_naive();
    store.put(&sample_record("AAPL", today)).await.unwrap();
    store
        .put(&sample_record("AAPL", today - Duration::days(1)))
        .await
        .unwrap();
    store.put(&sample_record("MSFT", today)).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.unique_symbols, 2);
    assert_eq!(stats.records_today, 2);
    assert!(stats.storage_size_bytes > 0);
}
