use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Discrete signal classification for a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalLabel {
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG_BUY")]
    StrongBuy,
    #[serde(rename = "STRONG_SELL")]
    StrongSell,
}

impl SignalLabel {
    pub fn is_buy_side(&self) -> bool {
        matches!(self, SignalLabel::Buy | SignalLabel::StrongBuy)
    }

    pub fn is_sell_side(&self) -> bool {
        matches!(self, SignalLabel::Sell | SignalLabel::StrongSell)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::Hold => "HOLD",
            SignalLabel::Buy => "BUY",
            SignalLabel::Sell => "SELL",
            SignalLabel::StrongBuy => "STRONG_BUY",
            SignalLabel::StrongSell => "STRONG_SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStrength {
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "STRONG")]
    Strong,
}

/// Informational MACD position category, independent of the signal label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdPosition {
    GoldenCross,
    DeadCross,
    UpTrend,
    DownTrend,
    Mixed,
}

impl MacdPosition {
    /// Human-readable description used in table output.
    pub fn describe(&self) -> &'static str {
        match self {
            MacdPosition::GoldenCross => "Golden Cross (Bullish)",
            MacdPosition::DeadCross => "Dead Cross (Bearish)",
            MacdPosition::UpTrend => "MACD & Signal above zero line (Up Trend)",
            MacdPosition::DownTrend => "MACD & Signal below zero line (Down Trend)",
            MacdPosition::Mixed => "Mixed Signals",
        }
    }
}

/// Upcoming corporate events one calendar day ahead of the evaluation point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarFlags {
    pub ex_dividend_tomorrow: bool,
    pub earnings_tomorrow: bool,
}

impl CalendarFlags {
    pub fn any(&self) -> bool {
        self.ex_dividend_tomorrow || self.earnings_tomorrow
    }
}

/// One row of the display tail carried on a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: Option<f64>,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub signal: SignalLabel,
}

/// The persisted/returned unit: the classified state of one symbol on one
/// calendar day. Immutable after creation for that day; upserts replace it
/// wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub current_price: f64,
    #[serde(rename = "currentRSI")]
    pub current_rsi: Option<f64>,
    pub current_signal: SignalLabel,
    pub signal_strength: SignalStrength,
    #[serde(rename = "currentMACD")]
    pub current_macd: f64,
    #[serde(rename = "currentMACDSignal")]
    pub current_macd_signal: f64,
    #[serde(rename = "currentMACDHistogram")]
    pub current_macd_histogram: f64,
    pub macd_position: MacdPosition,
    pub recent_buy_signals: u32,
    pub recent_sell_signals: u32,
    pub calendar_events: CalendarFlags,
    pub calendar_reasons: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub history: Vec<HistoryRow>,
}

/// Where an analysis entry came from. Request-scoped; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Database,
    Generated,
}

/// Explicit per-symbol failure inside a batch result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub symbol: String,
    pub error: String,
}

/// One element of a batch analysis: a source-tagged record, or an explicit
/// error for the symbol that failed. A failing symbol never aborts the
/// batch.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisEntry {
    Record {
        #[serde(flatten)]
        record: SignalRecord,
        source: SignalSource,
    },
    Error(ErrorEntry),
}

impl AnalysisEntry {
    pub fn record(&self) -> Option<&SignalRecord> {
        match self {
            AnalysisEntry::Record { record, .. } => Some(record),
            AnalysisEntry::Error(_) => None,
        }
    }

    pub fn source(&self) -> Option<SignalSource> {
        match self {
            AnalysisEntry::Record { source, .. } => Some(*source),
            AnalysisEntry::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorEntry> {
        match self {
            AnalysisEntry::Record { .. } => None,
            AnalysisEntry::Error(e) => Some(e),
        }
    }
}

/// Result of a batch analysis over a symbol set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub records: Vec<AnalysisEntry>,
    pub cached_count: usize,
    pub generated_count: usize,
}

impl AnalysisReport {
    pub fn error_count(&self) -> usize {
        self.records.iter().filter(|r| r.error().is_some()).count()
    }
}
