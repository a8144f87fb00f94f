use common::Candle;

use super::sma::sma;

/// Window of the rolling velocity baseline.
pub const VELOCITY_AVG_PERIOD: usize = 20;

/// Candle "velocity": the fraction of a bar's range occupied by its
/// open-close body, `|close-open| / (high-low)`. A proxy for directional
/// conviction within a single bar. Zero when `high == low`: a bar with no
/// range carries no conviction either way.
///
/// Defined at every index; there is no warmup.
pub fn candle_velocity(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .map(|c| {
            let range = c.range();
            if range == 0.0 {
                0.0
            } else {
                c.body() / range
            }
        })
        .collect()
}

/// Rolling mean of velocity over [`VELOCITY_AVG_PERIOD`] bars, the
/// baseline a spike is measured against.
pub fn velocity_average(velocity: &[f64]) -> Vec<Option<f64>> {
    sma(velocity, VELOCITY_AVG_PERIOD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_opt(i * 300, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn velocity_is_body_over_range() {
        // body 2.0, range 4.0
        let candles = vec![candle(0, 100.0, 103.0, 99.0, 102.0)];
        let velocity = candle_velocity(&candles);
        assert!((velocity[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn velocity_of_flat_candle_is_zero() {
        let candles = vec![candle(0, 100.0, 100.0, 100.0, 100.0)];
        assert_eq!(candle_velocity(&candles)[0], 0.0);
    }

    #[test]
    fn velocity_full_body_is_one() {
        // Marubozu: open at low, close at high
        let candles = vec![candle(0, 99.0, 103.0, 99.0, 103.0)];
        assert!((candle_velocity(&candles)[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn velocity_is_defined_at_every_index() {
        let candles: Vec<Candle> = (0..7).map(|i| candle(i, 100.0, 101.0, 99.0, 100.5)).collect();
        assert_eq!(candle_velocity(&candles).len(), candles.len());
    }

    #[test]
    fn velocity_average_warms_up_after_twenty_bars() {
        let candles: Vec<Candle> = (0..25).map(|i| candle(i, 100.0, 102.0, 98.0, 101.0)).collect();
        let velocity = candle_velocity(&candles);
        let average = velocity_average(&velocity);
        assert!(average[18].is_none());
        assert!(average[19].is_some());
        assert_eq!(average.len(), candles.len());
    }
}
