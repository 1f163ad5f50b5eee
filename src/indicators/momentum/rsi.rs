//! RSI (Relative Strength Index) indicator
//!
//! RSI = 100 - (100 / (1 + RS))
//! RS = Average Gain / Average Loss

/// Calculate the RSI series for a close-price sequence.
///
/// Average gain and loss are simple rolling means (window = `period`) of
/// the positive and negative price deltas, maintained as explicit
/// accumulators over a single forward pass. The first `period` entries are
/// `None`; a zero average loss saturates the index at 100.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;

    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };

        gains.push(gain);
        losses.push(loss);
        gain_sum += gain;
        loss_sum += loss;

        let window = gains.len();
        if window > period {
            gain_sum -= gains[window - period - 1];
            loss_sum -= losses[window - period - 1];
        }

        if window >= period {
            let avg_gain = gain_sum / period as f64;
            let avg_loss = loss_sum / period as f64;

            out[i] = Some(if avg_loss == 0.0 {
                100.0
            } else {
                let rs = avg_gain / avg_loss;
                100.0 - (100.0 / (1.0 + rs))
            });
        }
    }

    out
}
