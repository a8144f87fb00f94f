use serde::Serialize;

/// One Bollinger Band sample.
///
/// `bandwidth` is `(upper - lower) / sma`, normalized so compression can be
/// compared across instruments with different price scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerPoint {
    pub sma: f64,
    pub upper: f64,
    pub lower: f64,
    pub bandwidth: f64,
}

/// Bollinger Bands over a trailing window, aligned with the input.
///
/// Uses the population standard deviation of the window (the usual charting
/// convention). Indices before the window fills are `None`.
pub fn bollinger(closes: &[f64], period: usize, std_dev_multiplier: f64) -> Vec<Option<BollingerPoint>> {
    assert!(period >= 2, "Bollinger period must be >= 2");

    let mut out = vec![None; closes.len()];
    if closes.len() < period {
        return out;
    }

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let sma = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|c| (c - sma).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();

        let upper = sma + std_dev_multiplier * std_dev;
        let lower = sma - std_dev_multiplier * std_dev;
        out[i] = Some(BollingerPoint {
            sma,
            upper,
            lower,
            bandwidth: (upper - lower) / sma,
        });
    }

    out
}
