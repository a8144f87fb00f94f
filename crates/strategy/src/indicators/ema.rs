/// Exponential Moving Average, aligned index-for-index with its input.
///
/// Seeded with the simple average of the first `period` closes at index
/// `period - 1`, then `ema[i] = close[i]*k + ema[i-1]*(1-k)` with
/// `k = 2/(period+1)`. Indices before `period - 1` are `None`.
pub fn ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "EMA period must be >= 1");

    let mut out = vec![None; closes.len()];
    if closes.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut value = closes[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(value);

    for i in period..closes.len() {
        value = closes[i] * k + value * (1.0 - k);
        out[i] = Some(value);
    }

    out
}
