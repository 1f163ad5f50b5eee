//! Unit tests for the MACD series

use equitix::indicators::momentum::macd_series;
use equitix::indicators::trend::ema_series;

fn rising_closes(count: usize) -> Vec<f64> {
    (0..count).map(|i| 100.0 + i as f64 * 0.5).collect()
}

#[test]
fn all_series_are_aligned_with_input() {
    let closes = rising_closes(60);
    let macd = macd_series(&closes, 12, 26, 9);
    assert_eq!(macd.macd.len(), closes.len());
    assert_eq!(macd.signal.len(), closes.len());
    assert_eq!(macd.histogram.len(), closes.len());
}

#[test]
fn histogram_is_macd_minus_signal() {
    let closes = rising_closes(60);
    let macd = macd_series(&closes, 12, 26, 9);
    for i in 0..closes.len() {
        let expected = macd.macd[i] - macd.signal[i];
        assert!((macd.histogram[i] - expected).abs() < 1e-12);
    }
}

#[test]
fn macd_line_is_fast_ema_minus_slow_ema() {
    let closes = rising_closes(60);
    let macd = macd_series(&closes, 12, 26, 9);
    let fast = ema_series(&closes, 12);
    let slow = ema_series(&closes, 26);
    for i in 0..closes.len() {
        assert!((macd.macd[i] - (fast[i] - slow[i])).abs() < 1e-12);
    }
}

#[test]
fn constant_series_is_all_zero() {
    let closes = vec![250.0; 60];
    let macd = macd_series(&closes, 12, 26, 9);
    for i in 0..closes.len() {
        assert!(macd.macd[i].abs() < 1e-12);
        assert!(macd.signal[i].abs() < 1e-12);
        assert!(macd.histogram[i].abs() < 1e-12);
    }
}

#[test]
fn sustained_uptrend_turns_macd_positive() {
    let closes = rising_closes(120);
    let macd = macd_series(&closes, 12, 26, 9);
    let last = closes.len() - 1;
    assert!(macd.macd[last] > 0.0, "fast EMA should lead in an uptrend");
    assert!(macd.signal[last] > 0.0);
}
