//! Unit tests for the RSI series

use equitix::indicators::momentum::rsi_series;

fn oscillating_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 1.5)
        .collect()
}

#[test]
fn output_is_aligned_with_input() {
    let closes = oscillating_closes(40);
    assert_eq!(rsi_series(&closes, 14).len(), closes.len());
}

#[test]
fn short_series_is_undefined_everywhere() {
    for len in 0..=14 {
        let closes = oscillating_closes(len);
        let rsi = rsi_series(&closes, 14);
        assert!(
            rsi.iter().all(|v| v.is_none()),
            "series of length {} should have no defined RSI",
            len
        );
    }
}

#[test]
fn warm_up_window_is_undefined_then_defined() {
    let closes = oscillating_closes(40);
    let rsi = rsi_series(&closes, 14);
    for (i, value) in rsi.iter().enumerate() {
        if i < 14 {
            assert!(value.is_none(), "index {} should be undefined", i);
        } else {
            assert!(value.is_some(), "index {} should be defined", i);
        }
    }
}

#[test]
fn values_are_bounded() {
    let closes = oscillating_closes(120);
    for value in rsi_series(&closes, 14).into_iter().flatten() {
        assert!((0.0..=100.0).contains(&value), "RSI {} out of bounds", value);
    }
}

#[test]
fn monotonic_gains_saturate_at_100() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let rsi = rsi_series(&closes, 14);
    assert_eq!(rsi.last().copied().flatten(), Some(100.0));
}

#[test]
fn flat_series_saturates_at_100() {
    // No losses at all: avg_loss == 0 saturates the index.
    let closes = vec![100.0; 20];
    let rsi = rsi_series(&closes, 14);
    assert_eq!(rsi.last().copied().flatten(), Some(100.0));
}

#[test]
fn fifteen_close_scenario_pins_the_rolling_mean_convention() {
    // Rolling means over 14 deltas: gains sum 4.25, losses sum 2.0,
    // RS = 2.125, RSI = 100 - 100/3.125 = 68.0 exactly.
    let closes = vec![
        44.0, 44.25, 44.5, 43.75, 44.5, 45.0, 45.5, 46.0, 46.25, 45.75, 46.0, 46.5, 47.0, 46.5,
        46.25,
    ];
    let rsi = rsi_series(&closes, 14);

    for (i, value) in rsi.iter().enumerate().take(14) {
        assert!(value.is_none(), "index {} should be undefined", i);
    }
    let last = rsi[14].expect("final index should be defined");
    assert!((last - 68.0).abs() < 1e-9, "expected 68.0, got {}", last);
}
