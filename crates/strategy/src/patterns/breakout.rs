use serde::Serialize;

use common::{Direction, Result};

use crate::patterns::compression::COMPRESSION_LOOKBACK;
use crate::structure::StructureSnapshot;

/// RSI must exceed this for a long breakout to count as momentum-confirmed.
pub const RSI_LONG_CONFIRM: f64 = 55.0;
/// RSI must be below this for a short breakout to count as momentum-confirmed.
pub const RSI_SHORT_CONFIRM: f64 = 45.0;

/// Why the breakout step produced, or withheld, a direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BreakoutReason {
    BrokeAboveWithMomentum,
    BrokeBelowWithMomentum,
    InsideRange,
    /// Price closed outside the range but RSI did not confirm. This is
    /// explicitly "no signal", not a weaker long/short.
    MomentumNotConfirmed { attempted: Direction, rsi: f64 },
    /// Close beyond both sides at once cannot happen under the range
    /// definition; if it ever did, reject rather than pick a side.
    ConflictingBreakout,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakoutResult {
    pub signal: Option<Direction>,
    pub range_high: f64,
    pub range_low: f64,
    pub close: f64,
    pub rsi: f64,
    pub reason: BreakoutReason,
}

/// Breakout confirmation with a momentum filter.
///
/// The range is the high/low extent of the compression lookback window,
/// excluding the current candle. A long needs a close above the range high
/// with RSI above [`RSI_LONG_CONFIRM`]; a short mirrors it below
/// [`RSI_SHORT_CONFIRM`].
pub fn confirm_breakout(snapshot: &StructureSnapshot) -> Result<BreakoutResult> {
    let rsi = snapshot.rsi_at_current()?;
    let close = snapshot.current_candle().close;

    let window = &snapshot.entry[snapshot.current - COMPRESSION_LOOKBACK..snapshot.current];
    let range_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let range_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);

    let broke_above = close > range_high;
    let broke_below = close < range_low;

    let (signal, reason) = match (broke_above, broke_below) {
        (true, true) => (None, BreakoutReason::ConflictingBreakout),
        (true, false) => {
            if rsi > RSI_LONG_CONFIRM {
                (Some(Direction::Long), BreakoutReason::BrokeAboveWithMomentum)
            } else {
                (
                    None,
                    BreakoutReason::MomentumNotConfirmed {
                        attempted: Direction::Long,
                        rsi,
                    },
                )
            }
        }
        (false, true) => {
            if rsi < RSI_SHORT_CONFIRM {
                (Some(Direction::Short), BreakoutReason::BrokeBelowWithMomentum)
            } else {
                (
                    None,
                    BreakoutReason::MomentumNotConfirmed {
                        attempted: Direction::Short,
                        rsi,
                    },
                )
            }
        }
        (false, false) => (None, BreakoutReason::InsideRange),
    };

    Ok(BreakoutResult {
        signal,
        range_high,
        range_low,
        close,
        rsi,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Timeframe;

    use crate::structure::StructureSnapshot;
    use crate::testdata::{quiet_bar, snapshot_with_tail, trending_series, Bar};

    fn narrow(price: f64) -> Bar {
        Bar {
            open: price,
            high: price + 0.1,
            low: price - 0.1,
            close: price,
            volume: 1000.0,
        }
    }

    /// Entry series whose closes alternate a 0.8 loss and a 0.4 gain, so RSI
    /// settles near 33 before the tail is appended.
    fn bearish_snapshot(tail: &[Bar]) -> StructureSnapshot {
        let base_len = 210 - tail.len();
        let mut bars = Vec::with_capacity(210);
        let mut close = 150.0;
        for i in 0..base_len {
            let delta = if i % 2 == 0 { -0.8 } else { 0.4 };
            let open = close;
            close += delta;
            bars.push(Bar {
                open,
                high: open.max(close) + 0.3,
                low: open.min(close) - 0.3,
                close,
                volume: 1000.0,
            });
        }
        bars.extend_from_slice(tail);
        let entry: Vec<_> = bars
            .into_iter()
            .enumerate()
            .map(|(i, b)| b.into_candle(i, Timeframe::M5))
            .collect();
        let context = trending_series(200, 200.0, -0.1, Timeframe::H1);
        StructureSnapshot::build(Timeframe::M5, entry, Timeframe::H1, context).unwrap()
    }

    #[test]
    fn close_above_range_with_momentum_is_long() {
        // Constant closes keep average loss at zero, so RSI reads 100.
        let breakout = Bar {
            open: 100.0,
            high: 100.7,
            low: 99.95,
            close: 100.6,
            volume: 1000.0,
        };
        let tail = [narrow(100.1), narrow(100.1), narrow(100.1), narrow(100.1), narrow(100.1), breakout];
        let snapshot = snapshot_with_tail(quiet_bar(), &tail);
        let result = confirm_breakout(&snapshot).unwrap();
        assert!((result.range_high - 100.2).abs() < 1e-9);
        assert_eq!(result.signal, Some(Direction::Long));
        assert_eq!(result.reason, BreakoutReason::BrokeAboveWithMomentum);
    }

    #[test]
    fn close_above_range_without_momentum_is_no_signal() {
        // Bearish history keeps RSI far below the long-confirmation line
        // even though the close clears the range high.
        let level = 150.0 - 204.0 / 2.0 * 0.4; // last base close
        let breakout = Bar {
            open: level,
            high: level + 0.6,
            low: level - 0.05,
            close: level + 0.5,
            volume: 1000.0,
        };
        let tail = [
            narrow(level),
            narrow(level),
            narrow(level),
            narrow(level),
            narrow(level),
            breakout,
        ];
        let snapshot = bearish_snapshot(&tail);
        let result = confirm_breakout(&snapshot).unwrap();
        assert!(result.close > result.range_high);
        assert!(result.rsi < RSI_LONG_CONFIRM, "rsi {}", result.rsi);
        assert_eq!(result.signal, None);
        assert!(matches!(
            result.reason,
            BreakoutReason::MomentumNotConfirmed { attempted: Direction::Long, .. }
        ));
    }

    #[test]
    fn close_below_range_with_momentum_is_short() {
        let level = 150.0 - 204.0 / 2.0 * 0.4;
        let breakdown = Bar {
            open: level,
            high: level + 0.05,
            low: level - 0.6,
            close: level - 0.5,
            volume: 1000.0,
        };
        let tail = [
            narrow(level),
            narrow(level),
            narrow(level),
            narrow(level),
            narrow(level),
            breakdown,
        ];
        let snapshot = bearish_snapshot(&tail);
        let result = confirm_breakout(&snapshot).unwrap();
        assert!(result.close < result.range_low);
        assert!(result.rsi < RSI_SHORT_CONFIRM, "rsi {}", result.rsi);
        assert_eq!(result.signal, Some(Direction::Short));
        assert_eq!(result.reason, BreakoutReason::BrokeBelowWithMomentum);
    }

    #[test]
    fn close_inside_range_is_no_signal() {
        let inside = narrow(100.1);
        let tail = [narrow(100.1), narrow(100.1), narrow(100.1), narrow(100.1), narrow(100.1), inside];
        let snapshot = snapshot_with_tail(quiet_bar(), &tail);
        let result = confirm_breakout(&snapshot).unwrap();
        assert_eq!(result.signal, None);
        assert_eq!(result.reason, BreakoutReason::InsideRange);
    }
}
