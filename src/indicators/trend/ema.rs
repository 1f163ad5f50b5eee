//! EMA (Exponential Moving Average) indicator

/// Calculate the EMA series for a sequence of values.
///
/// Smoothing factor alpha = 2 / (span + 1). The series is seeded with the
/// first observation and carries no bias adjustment, so values exist from
/// index 0 but only stabilize once roughly `span` observations have been
/// absorbed. This seeding convention is relied on by the MACD series and
/// must not change independently of it.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    if values.is_empty() || span == 0 {
        return Vec::new();
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);

    for &value in &values[1..] {
        prev = alpha * value + (1.0 - alpha) * prev;
        out.push(prev);
    }

    out
}
