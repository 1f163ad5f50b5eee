//! Cron-based scheduler for periodic market scans and store maintenance.
//!
//! Three scheduled tasks, mirroring the batch job surface: an hourly
//! signal scan over the configured symbols, a daily retention purge at
//! 02:00, and a six-hourly health check. Scan ticks never overlap: a tick
//! that fires while the previous scan is still running is skipped.

use cron::Schedule;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::analysis::Analyzer;
use crate::metrics::Metrics;

const SCAN_CRON: &str = "0 0 * * * *";
const PURGE_CRON: &str = "0 0 2 * * *";
const HEALTH_CRON: &str = "0 0 */6 * * *";

struct SchedulerInner {
    analyzer: Arc<Analyzer>,
    symbols: Vec<String>,
    retention_days: i64,
    scan_in_flight: AtomicBool,
    metrics: Option<Arc<Metrics>>,
}

impl SchedulerInner {
    async fn run_scan_once(&self) -> bool {
        if self.scan_in_flight.swap(true, Ordering::SeqCst) {
            warn!("previous scan still running, skipping this tick");
            return false;
        }

        if self.symbols.is_empty() {
            warn!("no symbols configured for scanning");
            self.scan_in_flight.store(false, Ordering::SeqCst);
            return true;
        }

        let start = Instant::now();
        info!(symbol_count = self.symbols.len(), "starting scheduled signal scan");
        let report = self.analyzer.analyze(&self.symbols, None).await;

        let mut buy_signals = Vec::new();
        let mut sell_signals = Vec::new();
        for entry in &report.records {
            if let Some(record) = entry.record() {
                if record.current_signal.is_buy_side() {
                    buy_signals.push(record.symbol.clone());
                } else if record.current_signal.is_sell_side() {
                    sell_signals.push(record.symbol.clone());
                }
            }
        }

        let elapsed = start.elapsed();
        info!(
            cached = report.cached_count,
            generated = report.generated_count,
            errors = report.error_count(),
            buys = buy_signals.len(),
            sells = sell_signals.len(),
            duration_secs = elapsed.as_secs_f64(),
            "signal scan completed"
        );
        if !buy_signals.is_empty() {
            info!(symbols = %buy_signals.join(", "), "buy signals");
        }
        if !sell_signals.is_empty() {
            info!(symbols = %sell_signals.join(", "), "sell signals");
        }

        if let Some(ref metrics) = self.metrics {
            metrics.scan_duration_seconds.observe(elapsed.as_secs_f64());
        }

        self.scan_in_flight.store(false, Ordering::SeqCst);
        true
    }

    async fn run_cleanup_once(&self) {
        info!(retention_days = self.retention_days, "starting store cleanup");
        match self.analyzer.purge_older_than(self.retention_days).await {
            Ok(deleted) => info!(deleted = deleted, "cleaned up old signal records"),
            Err(e) => error!(error = %e, "store cleanup failed"),
        }
    }

    async fn run_health_check(&self) -> bool {
        match self.analyzer.stats().await {
            Ok(stats) => {
                info!(
                    total_records = stats.total_records,
                    records_today = stats.records_today,
                    "health check: store accessible"
                );
                true
            }
            Err(e) => {
                error!(error = %e, "health check failed");
                false
            }
        }
    }
}

/// Sleep until each cron tick, then run the task.
async fn run_on_schedule<F, Fut>(inner: Arc<SchedulerInner>, schedule: Schedule, task: F)
where
    F: Fn(Arc<SchedulerInner>) -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let mut upcoming = schedule.upcoming(chrono::Utc);
        if let Some(next_tick) = upcoming.next() {
            let now = chrono::Utc::now();
            if next_tick > now {
                let duration = (next_tick - now).to_std().unwrap_or_default();
                tokio::time::sleep(duration).await;
            }
        } else {
            tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
            continue;
        }

        task(inner.clone()).await;
    }
}

pub struct ScanScheduler {
    inner: Arc<SchedulerInner>,
    scan_schedule: Schedule,
    purge_schedule: Schedule,
    health_schedule: Schedule,
    handles: RwLock<Vec<tokio::task::JoinHandle<()>>>,
}

impl ScanScheduler {
    pub fn new(
        analyzer: Arc<Analyzer>,
        symbols: Vec<String>,
        retention_days: i64,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scan_schedule = Schedule::from_str(SCAN_CRON)?;
        let purge_schedule = Schedule::from_str(PURGE_CRON)?;
        let health_schedule = Schedule::from_str(HEALTH_CRON)?;

        info!(
            symbols = symbols.len(),
            retention_days = retention_days,
            "scheduler created: scan hourly, purge daily at 02:00, health check every 6h"
        );

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                analyzer,
                symbols,
                retention_days,
                scan_in_flight: AtomicBool::new(false),
                metrics,
            }),
            scan_schedule,
            purge_schedule,
            health_schedule,
            handles: RwLock::new(Vec::new()),
        })
    }

    /// Run one full scan immediately. Returns `false` when a previous scan
    /// was still in flight and this one was skipped.
    pub async fn run_scan_once(&self) -> bool {
        self.inner.run_scan_once().await
    }

    /// Delete records past the retention window.
    pub async fn run_cleanup_once(&self) {
        self.inner.run_cleanup_once().await
    }

    /// Verify the store is reachable; logs the outcome.
    pub async fn run_health_check(&self) -> bool {
        self.inner.run_health_check().await
    }

    /// Start the scheduled tasks in background loops.
    pub async fn start(&self) {
        let mut handles = self.handles.write().await;

        let inner = self.inner.clone();
        let schedule = self.scan_schedule.clone();
        handles.push(tokio::spawn(async move {
            run_on_schedule(inner, schedule, |s| async move {
                s.run_scan_once().await;
            })
            .await;
        }));

        let inner = self.inner.clone();
        let schedule = self.purge_schedule.clone();
        handles.push(tokio::spawn(async move {
            run_on_schedule(inner, schedule, |s| async move {
                s.run_cleanup_once().await;
            })
            .await;
        }));

        let inner = self.inner.clone();
        let schedule = self.health_schedule.clone();
        handles.push(tokio::spawn(async move {
            run_on_schedule(inner, schedule, |s| async move {
                s.run_health_check().await;
            })
            .await;
        }));

        info!("scheduler started");
    }

    /// Stop all scheduled tasks.
    pub async fn stop(&self) {
        let mut handles = self.handles.write().await;
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("scheduler stopped");
    }
}
