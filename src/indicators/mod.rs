pub mod momentum;
pub mod trend;

use crate::config::SignalConfig;
use crate::models::indicators::IndicatorSeries;
use crate::models::price::PriceBar;

/// Compute the full indicator series for a bar sequence.
///
/// Output series are aligned one-to-one with the input; RSI entries before
/// the warm-up window are `None`.
pub fn compute(bars: &[PriceBar], config: &SignalConfig) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries {
        rsi: momentum::rsi_series(&closes, config.rsi_period),
        macd: momentum::macd_series(
            &closes,
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        ),
    }
}
