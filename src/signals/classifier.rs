//! Stateless rules mapping indicator values to discrete signal labels.
//!
//! Each bar is classified independently from its own indicator values plus
//! the previous bar's MACD pair (for crossover detection). Precedence per
//! bar: RSI thresholds set the base label, a MACD crossover upgrades or
//! derives a label, and the calendar override is applied last, to the most
//! recent bar only.

use crate::config::SignalConfig;
use crate::models::indicators::IndicatorSeries;
use crate::models::signal::{CalendarFlags, MacdPosition, SignalLabel, SignalStrength};

/// Classify every bar of an indicator series.
///
/// Bars whose RSI is still in the warm-up window stay HOLD and are never
/// upgraded by a crossover.
pub fn label_series(indicators: &IndicatorSeries, config: &SignalConfig) -> Vec<SignalLabel> {
    let len = indicators.len();
    let mut labels = Vec::with_capacity(len);

    for i in 0..len {
        let mut label = SignalLabel::Hold;

        let rsi = indicators.rsi[i];
        if let Some(rsi) = rsi {
            if rsi <= config.oversold_threshold {
                label = SignalLabel::Buy;
            } else if rsi >= config.overbought_threshold {
                label = SignalLabel::Sell;
            }
        }

        if i > 0 {
            let macd = &indicators.macd;
            let bullish = macd.macd[i] > macd.signal[i] && macd.macd[i - 1] <= macd.signal[i - 1];
            let bearish = macd.macd[i] < macd.signal[i] && macd.macd[i - 1] >= macd.signal[i - 1];

            if bullish {
                match (label, rsi) {
                    (SignalLabel::Buy, _) => label = SignalLabel::StrongBuy,
                    (SignalLabel::Hold, Some(r)) if r < 50.0 => label = SignalLabel::Buy,
                    _ => {}
                }
            } else if bearish {
                match (label, rsi) {
                    (SignalLabel::Sell, _) => label = SignalLabel::StrongSell,
                    (SignalLabel::Hold, Some(r)) if r > 50.0 => label = SignalLabel::Sell,
                    _ => {}
                }
            }
        }

        labels.push(label);
    }

    labels
}

/// Force the most recent label to SELL when a corporate event falls
/// tomorrow. Never applied retroactively to historical bars.
pub fn apply_calendar_override(labels: &mut [SignalLabel], flags: &CalendarFlags) {
    if flags.any() {
        if let Some(last) = labels.last_mut() {
            *last = SignalLabel::Sell;
        }
    }
}

/// Signal strength from the final RSI value. STRONG requires the stricter
/// thresholds, not merely oversold/overbought.
pub fn strength(rsi: Option<f64>, config: &SignalConfig) -> SignalStrength {
    match rsi {
        Some(r) if r <= config.strong_buy_threshold || r >= config.strong_sell_threshold => {
            SignalStrength::Strong
        }
        _ => SignalStrength::Normal,
    }
}

/// MACD position category from the final MACD/signal pair.
pub fn macd_position(macd: f64, signal: f64) -> MacdPosition {
    if macd > signal && macd > 0.0 && signal > 0.0 {
        MacdPosition::GoldenCross
    } else if macd < signal && macd < 0.0 && signal < 0.0 {
        MacdPosition::DeadCross
    } else if macd > 0.0 && signal > 0.0 {
        MacdPosition::UpTrend
    } else if macd < 0.0 && signal < 0.0 {
        MacdPosition::DownTrend
    } else {
        MacdPosition::Mixed
    }
}

/// Count buy-side and sell-side labels over the trailing window.
pub fn recent_counts(labels: &[SignalLabel], window: usize) -> (u32, u32) {
    let start = labels.len().saturating_sub(window);
    let recent = &labels[start..];

    let buys = recent.iter().filter(|l| l.is_buy_side()).count() as u32;
    let sells = recent.iter().filter(|l| l.is_sell_side()).count() as u32;
    (buys, sells)
}

/// Human-readable reasons for an active calendar override.
pub fn calendar_reasons(flags: &CalendarFlags) -> Vec<String> {
    let mut reasons = Vec::new();
    if flags.ex_dividend_tomorrow {
        reasons.push("Ex-dividend date tomorrow".to_string());
    }
    if flags.earnings_tomorrow {
        reasons.push("Earnings report tomorrow".to_string());
    }
    reasons
}
