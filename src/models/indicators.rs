use serde::{Deserialize, Serialize};

/// MACD line, signal line and histogram, each aligned one-to-one with the
/// close series they were computed from. Values exist from the first index
/// under the seeded-EMA convention but are unreliable until each component
/// EMA has seen at least its span of observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdSeries {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }
}

/// Per-bar indicator values aligned with the bar sequence.
///
/// Invariant: every series has the same length as the source bar sequence.
/// Undefined entries (RSI warm-up) are `None`, never `0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub rsi: Vec<Option<f64>>,
    pub macd: MacdSeries,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }
}
