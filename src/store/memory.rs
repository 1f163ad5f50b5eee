//! In-memory signal store
//!
//! Backs tests and serves as the degraded runtime fallback when Postgres
//! is unreachable: analysis still works, caching just stops surviving the
//! process.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::SignalError;
use crate::models::signal::SignalRecord;
use crate::store::{Partition, SignalStore, StoreStats};

#[derive(Default)]
pub struct MemorySignalStore {
    records: RwLock<HashMap<(String, NaiveDate), SignalRecord>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn get(&self, symbol: &str, date: NaiveDate) -> Option<SignalRecord> {
        let records = self.records.read().await;
        records.get(&(symbol.to_string(), date)).cloned()
    }

    async fn put(&self, record: &SignalRecord) -> Result<(), SignalError> {
        let mut records = self.records.write().await;
        records.insert((record.symbol.clone(), record.date), record.clone());
        Ok(())
    }

    async fn get_many(&self, symbols: &[String], date: NaiveDate) -> Partition {
        let records = self.records.read().await;
        let mut partition = Partition::default();
        for symbol in symbols {
            match records.get(&(symbol.clone(), date)) {
                Some(record) => partition.cached.push(record.clone()),
                None => partition.missing.push(symbol.clone()),
            }
        }
        partition
    }

    async fn purge_older_than(&self, days: i64) -> Result<u64, SignalError> {
        let cutoff = Utc::now().date_naive() - Duration::days(days);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|(_, date), _| *date >= cutoff);
        Ok((before - records.len()) as u64)
    }

    async fn stats(&self) -> Result<StoreStats, SignalError> {
        let records = self.records.read().await;
        let today = Utc::now().date_naive();

        let unique_symbols = {
            let mut symbols: Vec<&str> = records.keys().map(|(s, _)| s.as_str()).collect();
            symbols.sort_unstable();
            symbols.dedup();
            symbols.len() as u64
        };

        // Serialized size stands in for on-disk storage
        let storage_size_bytes: u64 = records
            .values()
            .map(|r| serde_json::to_string(r).map(|s| s.len() as u64).unwrap_or(0))
            .sum();

        Ok(StoreStats {
            total_records: records.len() as u64,
            unique_symbols,
            records_today: records.keys().filter(|(_, d)| *d == today).count() as u64,
            storage_size_bytes,
        })
    }
}
