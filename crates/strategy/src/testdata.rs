//! Synthetic candle series builders shared by unit and integration tests.

use chrono::{TimeZone, Utc};
use common::{Candle, Timeframe};

/// Shape of one synthetic bar, timestamp assigned by the series builder.
#[derive(Debug, Clone, Copy)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn into_candle(self, index: usize, timeframe: Timeframe) -> Candle {
        let step = timeframe.duration().num_seconds();
        Candle {
            timestamp: Utc.timestamp_opt(1_700_000_000 + index as i64 * step, 0).unwrap(),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// `len` copies of `base` followed by `tail`, contiguous at the timeframe's
/// spacing. `len` counts the whole series including the tail.
pub fn series_with_tail(
    len: usize,
    base: Bar,
    tail: &[Bar],
    timeframe: Timeframe,
) -> Vec<Candle> {
    assert!(len >= tail.len(), "series length shorter than tail");
    let mut bars = vec![base; len - tail.len()];
    bars.extend_from_slice(tail);
    bars.into_iter()
        .enumerate()
        .map(|(i, bar)| bar.into_candle(i, timeframe))
        .collect()
}

/// Doji bars at a constant price with the given high-low range.
pub fn flat_series(len: usize, price: f64, range: f64, timeframe: Timeframe) -> Vec<Candle> {
    let bar = Bar {
        open: price,
        high: price + range / 2.0,
        low: price - range / 2.0,
        close: price,
        volume: 1000.0,
    };
    series_with_tail(len, bar, &[], timeframe)
}

/// A warmed-up snapshot: a 210-bar m5 entry series of `base` bars ending in
/// `tail`, against a 200-bar h1 uptrending context series.
pub fn snapshot_with_tail(base: Bar, tail: &[Bar]) -> crate::structure::StructureSnapshot {
    let entry = series_with_tail(210, base, tail, Timeframe::M5);
    let context = trending_series(200, 100.0, 0.1, Timeframe::H1);
    crate::structure::StructureSnapshot::build(Timeframe::M5, entry, Timeframe::H1, context)
        .expect("snapshot from synthetic series")
}

/// The base bar used by most detector tests: body 0.2 inside a 1.0 range,
/// constant close, volume 1000.
pub fn quiet_bar() -> Bar {
    Bar {
        open: 99.9,
        high: 100.5,
        low: 99.5,
        close: 100.1,
        volume: 1000.0,
    }
}

/// Bars whose closes march from `start` in increments of `step`
/// (negative step for a downtrend).
pub fn trending_series(len: usize, start: f64, step: f64, timeframe: Timeframe) -> Vec<Candle> {
    (0..len)
        .map(|i| {
            let close = start + step * i as f64;
            let open = close - step;
            let pad = step.abs().max(0.05);
            Bar {
                open,
                high: open.max(close) + pad,
                low: open.min(close) - pad,
                close,
                volume: 1000.0,
            }
            .into_candle(i, timeframe)
        })
        .collect()
}
