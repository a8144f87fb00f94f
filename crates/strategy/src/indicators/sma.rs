/// Simple rolling mean, aligned with the input. Used for the volume
/// baseline. `None` until the trailing window fills.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "SMA period must be >= 1");

    let mut out = vec![None; values.len()];
    if values.len() < period {
        return out;
    }

    let mut window_sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(window_sum / period as f64);

    for i in period..values.len() {
        window_sum += values[i] - values[i - period];
        out[i] = Some(window_sum / period as f64);
    }

    out
}
