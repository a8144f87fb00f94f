use common::Candle;

/// Average True Range with Wilder smoothing, aligned with its input.
///
/// True range `max(high-low, |high-prevClose|, |low-prevClose|)` needs a
/// previous close, so the first bar has none. The seed is the simple
/// average of the first `period` true ranges and lands at index `period`;
/// later values use `atr[i] = (atr[i-1]*(period-1) + tr[i]) / period`.
pub fn atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "ATR period must be >= 1");

    let mut out = vec![None; candles.len()];
    if candles.len() < period + 1 {
        return out;
    }

    let true_ranges: Vec<f64> = candles
        .windows(2)
        .map(|w| {
            let prev_close = w[0].close;
            let bar = &w[1];
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        })
        .collect();

    let mut value = true_ranges[..period].iter().sum::<f64>() / period as f64;
    out[period] = Some(value);

    // true_ranges[i] belongs to candle index i + 1
    for (i, tr) in true_ranges.iter().enumerate().skip(period) {
        value = (value * (period as f64 - 1.0) + tr) / period as f64;
        out[i + 1] = Some(value);
    }

    out
}
