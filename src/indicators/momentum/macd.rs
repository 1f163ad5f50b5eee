//! MACD (Moving Average Convergence Divergence) indicator
//!
//! MACD = EMA(fast) - EMA(slow)
//! Signal = EMA(MACD, signal span)
//! Histogram = MACD - Signal

use crate::indicators::trend::ema_series;
use crate::models::indicators::MacdSeries;

/// Calculate the MACD series for a close-price sequence.
///
/// All three output series share the input length. Under the seeded-EMA
/// convention every index has a value, but entries are unreliable until
/// the slow EMA has absorbed `slow` observations and the signal EMA a
/// further `signal` on top.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_series(&macd, signal);

    let histogram: Vec<f64> = macd
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}
