//! Market data capability seams consumed by the analysis orchestrator.

use async_trait::async_trait;

use crate::error::SignalError;
use crate::models::price::PriceBar;
use crate::models::signal::CalendarFlags;

/// Source of historical price series.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the time-ordered bar sequence for a symbol over a range such
    /// as "1y". Fails with `SignalError::NoData` when the source returns an
    /// empty series and `SignalError::Fetch` once retries are exhausted.
    async fn fetch_history(&self, symbol: &str, range: &str)
        -> Result<Vec<PriceBar>, SignalError>;
}

/// Source of upcoming corporate calendar events.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Flags for events falling exactly one calendar day ahead. Lookup
    /// failures are non-fatal; callers degrade to all-false flags.
    async fn calendar_flags(&self, symbol: &str) -> Result<CalendarFlags, SignalError>;
}
