//! Postgres-backed signal store

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls};
use tracing::warn;

use crate::config;
use crate::error::SignalError;
use crate::models::signal::SignalRecord;
use crate::store::{Partition, SignalStore, StoreStats};

/// Signal store over a Postgres connection. Records are stored wholesale
/// as JSON text keyed by (symbol, date); the primary key enforces the
/// one-record-per-day invariant and the upsert resolves concurrent writers
/// last-write-wins.
pub struct PostgresSignalStore {
    client: Arc<RwLock<Option<Client>>>,
}

impl PostgresSignalStore {
    pub async fn connect() -> Result<Self, SignalError> {
        let database_url = config::get_database_url();
        let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
            .await
            .map_err(|e| SignalError::StoreRead(format!("failed to connect: {}", e)))?;

        // Drive the connection on its own task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "Postgres connection error");
            }
        });

        let store = Self {
            client: Arc::new(RwLock::new(Some(client))),
        };

        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), SignalError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            c.execute(
                "CREATE TABLE IF NOT EXISTS signals (
                    symbol TEXT NOT NULL,
                    date DATE NOT NULL,
                    record TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    PRIMARY KEY (symbol, date)
                )",
                &[],
            )
            .await
            .map_err(|e| SignalError::StoreWrite(format!("failed to create signals table: {}", e)))?;
        }

        Ok(())
    }
}

#[async_trait]
impl SignalStore for PostgresSignalStore {
    async fn get(&self, symbol: &str, date: NaiveDate) -> Option<SignalRecord> {
        let client = self.client.read().await;
        let c = (*client).as_ref()?;

        // Query or decode failures degrade to a miss so the caller
        // recomputes instead of failing the request.
        let rows = match c
            .query(
                "SELECT record FROM signals WHERE symbol = $1 AND date = $2",
                &[&symbol, &date],
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(symbol = %symbol, %date, error = %e, "signal read failed, treating as cache miss");
                return None;
            }
        };

        let row = rows.first()?;
        let payload: String = row.get(0);
        match serde_json::from_str(&payload) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(symbol = %symbol, %date, error = %e, "stored record failed to decode, treating as cache miss");
                None
            }
        }
    }

    async fn put(&self, record: &SignalRecord) -> Result<(), SignalError> {
        let client = self.client.read().await;
        let c = (*client)
            .as_ref()
            .ok_or_else(|| SignalError::StoreWrite("connection not available".to_string()))?;

        let payload = serde_json::to_string(record)
            .map_err(|e| SignalError::StoreWrite(format!("failed to serialize record: {}", e)))?;

        c.execute(
            "INSERT INTO signals (symbol, date, record)
             VALUES ($1, $2, $3)
             ON CONFLICT (symbol, date)
             DO UPDATE SET record = EXCLUDED.record, created_at = now()",
            &[&record.symbol, &record.date, &payload],
        )
        .await
        .map_err(|e| SignalError::StoreWrite(format!("failed to upsert record: {}", e)))?;

        Ok(())
    }

    async fn get_many(&self, symbols: &[String], date: NaiveDate) -> Partition {
        let mut partition = Partition::default();
        for symbol in symbols {
            match self.get(symbol, date).await {
                Some(record) => partition.cached.push(record),
                None => partition.missing.push(symbol.clone()),
            }
        }
        partition
    }

    async fn purge_older_than(&self, days: i64) -> Result<u64, SignalError> {
        let client = self.client.read().await;
        let c = (*client)
            .as_ref()
            .ok_or_else(|| SignalError::StoreWrite("connection not available".to_string()))?;

        let cutoff = Utc::now().date_naive() - Duration::days(days);
        let deleted = c
            .execute("DELETE FROM signals WHERE date < $1", &[&cutoff])
            .await
            .map_err(|e| SignalError::StoreWrite(format!("failed to purge records: {}", e)))?;

        Ok(deleted)
    }

    async fn stats(&self) -> Result<StoreStats, SignalError> {
        let client = self.client.read().await;
        let c = (*client)
            .as_ref()
            .ok_or_else(|| SignalError::StoreRead("connection not available".to_string()))?;

        let today = Utc::now().date_naive();
        let row = c
            .query_one(
                "SELECT COUNT(*),
                        COUNT(DISTINCT symbol),
                        COUNT(*) FILTER (WHERE date = $1),
                        pg_total_relation_size('signals')
                 FROM signals",
                &[&today],
            )
            .await
            .map_err(|e| SignalError::StoreRead(format!("failed to query stats: {}", e)))?;

        let total: i64 = row.get(0);
        let unique: i64 = row.get(1);
        let today_count: i64 = row.get(2);
        let size: i64 = row.get(3);

        Ok(StoreStats {
            total_records: total as u64,
            unique_symbols: unique as u64,
            records_today: today_count as u64,
            storage_size_bytes: size.max(0) as u64,
        })
    }
}
