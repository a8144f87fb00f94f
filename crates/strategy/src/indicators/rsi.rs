/// RSI (Relative Strength Index), aligned with its input.
///
/// Wilder's method (same as TradingView / standard RSI): seed average
/// gain/loss over the first `period` deltas, then smooth. The first defined
/// value lands at index `period`. RSI is `100.0` when the average loss is
/// exactly zero, the degenerate all-up case.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 2, "RSI period must be >= 2");

    let mut out = vec![None; closes.len()];
    if closes.len() < period + 1 {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain =
        changes[..period].iter().filter(|&&c| c > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period]
        .iter()
        .filter(|&&c| c < 0.0)
        .map(|c| c.abs())
        .sum::<f64>()
        / period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    // changes[i] belongs to close index i + 1
    for (i, &change) in changes.iter().enumerate().skip(period) {
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { change.abs() } else { 0.0 };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        out[i + 1] = Some(rsi_value(avg_gain, avg_loss));
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
