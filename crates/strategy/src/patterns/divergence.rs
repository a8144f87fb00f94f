use serde::Serialize;

use common::DivergenceKind;

use crate::structure::StructureSnapshot;

/// Bars examined for a divergence, current candle included.
pub const DIVERGENCE_LOOKBACK: usize = 10;

/// Price made a new local extreme while velocity failed to confirm it:
/// an early-exit warning for the position monitor, not an entry filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Divergence {
    pub kind: DivergenceKind,
    /// The price extreme the current bar printed.
    pub extreme_price: f64,
    pub current_velocity: f64,
    /// The velocity peak among the prior bars of the window.
    pub peak_velocity: f64,
}

/// Compare the current bar against the prior bars of the lookback window:
/// a new window high with velocity below the prior velocity peak is a
/// `Bullish` divergence, a new window low mirrors it as `Bearish`. Velocity,
/// not price, is what fails to confirm the new extreme.
pub fn detect_divergence(snapshot: &StructureSnapshot) -> Option<Divergence> {
    let current = snapshot.current;
    let start = current + 1 - DIVERGENCE_LOOKBACK;

    let prior = &snapshot.entry[start..current];
    let prior_velocity = &snapshot.velocity[start..current];

    let peak_velocity = prior_velocity.iter().copied().fold(f64::MIN, f64::max);
    let current_velocity = snapshot.velocity[current];
    if current_velocity >= peak_velocity {
        return None;
    }

    let candle = snapshot.current_candle();
    let prior_high = prior.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let prior_low = prior.iter().map(|c| c.low).fold(f64::MAX, f64::min);

    if candle.high > prior_high {
        return Some(Divergence {
            kind: DivergenceKind::Bullish,
            extreme_price: candle.high,
            current_velocity,
            peak_velocity,
        });
    }
    if candle.low < prior_low {
        return Some(Divergence {
            kind: DivergenceKind::Bearish,
            extreme_price: candle.low,
            current_velocity,
            peak_velocity,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{quiet_bar, snapshot_with_tail, Bar};

    /// A conviction bar: nearly full-body, velocity 0.9.
    fn conviction() -> Bar {
        Bar {
            open: 99.55,
            high: 100.5,
            low: 99.5,
            close: 100.45,
            volume: 1000.0,
        }
    }

    #[test]
    fn new_high_on_weak_velocity_is_bullish_divergence() {
        // Velocity peaked earlier in the window; the new high prints with a
        // small body.
        let weak_high = Bar {
            open: 100.5,
            high: 101.0,
            low: 100.0,
            close: 100.6,
            volume: 1000.0,
        };
        let tail = [conviction(), weak_high];
        let snapshot = snapshot_with_tail(quiet_bar(), &tail);
        let divergence = detect_divergence(&snapshot).expect("divergence expected");
        assert_eq!(divergence.kind, DivergenceKind::Bullish);
        assert!((divergence.extreme_price - 101.0).abs() < 1e-9);
        assert!(divergence.current_velocity < divergence.peak_velocity);
    }

    #[test]
    fn new_low_on_weak_velocity_is_bearish_divergence() {
        let weak_low = Bar {
            open: 99.5,
            high: 99.55,
            low: 99.0,
            close: 99.4,
            volume: 1000.0,
        };
        let tail = [conviction(), weak_low];
        let snapshot = snapshot_with_tail(quiet_bar(), &tail);
        let divergence = detect_divergence(&snapshot).expect("divergence expected");
        assert_eq!(divergence.kind, DivergenceKind::Bearish);
        assert!((divergence.extreme_price - 99.0).abs() < 1e-9);
    }

    #[test]
    fn no_new_extreme_is_no_divergence() {
        let tail = [conviction(), quiet_bar()];
        let snapshot = snapshot_with_tail(quiet_bar(), &tail);
        assert!(detect_divergence(&snapshot).is_none());
    }

    #[test]
    fn new_high_with_confirming_velocity_is_no_divergence() {
        // The breakout bar itself carries the window's best velocity.
        let strong_high = Bar {
            open: 100.05,
            high: 101.0,
            low: 100.0,
            close: 100.97,
            volume: 1000.0,
        };
        let tail = [strong_high];
        let snapshot = snapshot_with_tail(quiet_bar(), &tail);
        assert!(detect_divergence(&snapshot).is_none());
    }
}
