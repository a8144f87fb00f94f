use proptest::prelude::*;

use common::{Direction, Error, Quote, Signal};
use risk::{size, RiskParameters};

proptest! {
    /// Sizing is total over positive finite inputs: either a well-formed
    /// order or `InvalidStop`, never a panic, never a negative or
    /// non-finite volume.
    #[test]
    fn sizing_never_panics_and_volume_is_sane(
        entry in 0.0001f64..1_000_000.0,
        stop_offset in -10_000.0f64..10_000.0,
        equity in 1.0f64..100_000_000.0,
        risk_fraction in 0.001f64..0.1,
        point_value in 0.01f64..1_000.0,
    ) {
        let signal = Signal {
            direction: Direction::Long,
            entry_hint: entry,
            stop_hint: entry + stop_offset,
            signal_index: 209,
            fast_ema_at_signal: entry,
        };
        let quote = Quote { bid: entry, ask: entry };
        let params = RiskParameters { risk_fraction, point_value, lot_step: 0.01 };

        match size(&signal, quote, equity, &params) {
            Ok(order) => {
                prop_assert!(order.volume.is_finite());
                prop_assert!(order.volume >= 0.0);
                prop_assert!((order.risk_amount - equity * risk_fraction).abs() < 1e-6);
            }
            Err(Error::InvalidStop { .. }) => {
                // Only a stop that lands exactly on the entry is rejected
                // (including offsets small enough to vanish in f64).
                prop_assert_eq!(signal.stop_hint, entry);
            }
            Err(other) => {
                return Err(TestCaseError::fail(format!("unexpected error: {other:?}")));
            }
        }
    }

    /// The monetary amount at risk never exceeds the configured fraction of
    /// equity (up to lot-step rounding on the volume).
    #[test]
    fn risked_amount_tracks_the_fraction(
        entry in 1.0f64..100_000.0,
        stop_distance in 0.01f64..5_000.0,
        equity in 100.0f64..10_000_000.0,
    ) {
        let signal = Signal {
            direction: Direction::Short,
            entry_hint: entry,
            stop_hint: entry + stop_distance,
            signal_index: 209,
            fast_ema_at_signal: entry,
        };
        let quote = Quote { bid: entry, ask: entry + 0.1 };
        let params = RiskParameters { risk_fraction: 0.02, point_value: 1.0, lot_step: 0.01 };

        let order = size(&signal, quote, equity, &params).unwrap();
        let risked = order.volume * stop_distance;
        // Half a lot step of slack on either side of the target.
        let slack = 0.005 * stop_distance + 1e-6;
        prop_assert!(
            (risked - equity * 0.02).abs() <= slack,
            "risked {} vs target {}", risked, equity * 0.02
        );
    }
}
