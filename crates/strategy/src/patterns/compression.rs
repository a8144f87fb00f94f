use serde::Serialize;

use common::Result;

use crate::structure::StructureSnapshot;

/// How many candles back from the current index are examined.
pub const COMPRESSION_LOOKBACK: usize = 5;
/// A candle is "narrow" when its range is below this fraction of ATR.
pub const NARROW_RANGE_ATR_FACTOR: f64 = 0.5;
/// Minimum narrow candles in the lookback for the market to count as coiled.
pub const MIN_NARROW_COUNT: usize = 3;

/// Why compression did or did not register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompressionReason {
    Coiled { narrow_count: usize, lookback: usize },
    TooFewNarrowRanges { narrow_count: usize, lookback: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionResult {
    pub compressed: bool,
    pub narrow_count: usize,
    pub lookback: usize,
    /// ATR at the evaluation index, the yardstick the ranges were held to.
    pub atr: f64,
    pub reason: CompressionReason,
}

/// Range compression is the precondition for a breakout being informative
/// rather than noise: count how many of the candles in the lookback window
/// immediately before the current index have a range below half the current
/// ATR.
pub fn detect_compression(snapshot: &StructureSnapshot) -> Result<CompressionResult> {
    let atr = snapshot.atr_at_current()?;
    let threshold = NARROW_RANGE_ATR_FACTOR * atr;

    let window = &snapshot.entry[snapshot.current - COMPRESSION_LOOKBACK..snapshot.current];
    let narrow_count = window.iter().filter(|c| c.range() < threshold).count();

    let compressed = narrow_count >= MIN_NARROW_COUNT;
    let reason = if compressed {
        CompressionReason::Coiled {
            narrow_count,
            lookback: COMPRESSION_LOOKBACK,
        }
    } else {
        CompressionReason::TooFewNarrowRanges {
            narrow_count,
            lookback: COMPRESSION_LOOKBACK,
        }
    };

    Ok(CompressionResult {
        compressed,
        narrow_count,
        lookback: COMPRESSION_LOOKBACK,
        atr,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{quiet_bar, snapshot_with_tail, Bar};

    fn doji(range: f64) -> Bar {
        Bar {
            open: 100.1,
            high: 100.1 + range / 2.0,
            low: 100.1 - range / 2.0,
            close: 100.1,
            volume: 1000.0,
        }
    }

    #[test]
    fn exactly_three_narrow_of_five_is_compressed() {
        // Three 0.3-range bars, two 0.9-range bars, then a normal current bar.
        let tail = [
            doji(0.3),
            doji(0.3),
            doji(0.3),
            doji(0.9),
            doji(0.9),
            quiet_bar(),
        ];
        let snapshot = snapshot_with_tail(quiet_bar(), &tail);
        let result = detect_compression(&snapshot).unwrap();
        assert_eq!(result.narrow_count, 3);
        assert!(result.compressed);
        assert!(matches!(result.reason, CompressionReason::Coiled { narrow_count: 3, .. }));
    }

    #[test]
    fn exactly_two_narrow_of_five_is_not_compressed() {
        let tail = [
            doji(0.3),
            doji(0.3),
            doji(0.9),
            doji(0.9),
            doji(0.9),
            quiet_bar(),
        ];
        let snapshot = snapshot_with_tail(quiet_bar(), &tail);
        let result = detect_compression(&snapshot).unwrap();
        assert_eq!(result.narrow_count, 2);
        assert!(!result.compressed);
        assert!(matches!(
            result.reason,
            CompressionReason::TooFewNarrowRanges { narrow_count: 2, .. }
        ));
    }

    #[test]
    fn all_wide_ranges_are_not_compressed() {
        let snapshot = snapshot_with_tail(quiet_bar(), &[]);
        let result = detect_compression(&snapshot).unwrap();
        assert_eq!(result.narrow_count, 0);
        assert!(!result.compressed);
    }

    #[test]
    fn atr_at_evaluation_is_reported() {
        let snapshot = snapshot_with_tail(quiet_bar(), &[]);
        let result = detect_compression(&snapshot).unwrap();
        assert!(result.atr > 0.0);
        assert_eq!(result.lookback, COMPRESSION_LOOKBACK);
    }
}
