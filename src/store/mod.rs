//! Persistent signal cache keyed by (symbol, date)

mod memory;
mod postgres;

pub use memory::MemorySignalStore;
pub use postgres::PostgresSignalStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SignalError;
use crate::models::signal::SignalRecord;

/// Partition of a requested symbol set into cached records and symbols
/// still to be computed. Input order is preserved within each side; the
/// union of both sides equals the requested set.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub cached: Vec<SignalRecord>,
    pub missing: Vec<String>,
}

/// Store statistics for the operational endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_records: u64,
    pub unique_symbols: u64,
    pub records_today: u64,
    pub storage_size_bytes: u64,
}

/// Key-value interface over durable storage, holding at most one record
/// per (symbol, date) pair. The store enforces that invariant, not the
/// caller.
///
/// Read-side I/O failures are caught at the store boundary and degrade to
/// a cache miss (logged, never a crash); recomputation is the fallback
/// path, so correctness wins over caching. Do not "fix" this into a hard
/// failure. Write failures surface as `StoreWriteError` for the caller to
/// log and drop.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Exact-key lookup. `None` covers both absence and a degraded read.
    async fn get(&self, symbol: &str, date: NaiveDate) -> Option<SignalRecord>;

    /// Wholesale upsert for the record's (symbol, date) key. Concurrent
    /// writers for the same key resolve last-write-wins.
    async fn put(&self, record: &SignalRecord) -> Result<(), SignalError>;

    /// Partition `symbols` into cached records and missing symbols for one
    /// calendar day, preserving input order within each side.
    async fn get_many(&self, symbols: &[String], date: NaiveDate) -> Partition;

    /// Delete records strictly older than `days` before today; returns the
    /// number deleted.
    async fn purge_older_than(&self, days: i64) -> Result<u64, SignalError>;

    async fn stats(&self) -> Result<StoreStats, SignalError>;
}
