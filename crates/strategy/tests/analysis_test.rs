//! End-to-end detection scenarios over synthetic 300-bar series.

use common::{Direction, Error, Timeframe};
use strategy::patterns::BreakoutReason;
use strategy::rationale::{DetectionStage, RationaleEntry};
use strategy::testdata::{trending_series, Bar};
use strategy::{analyze, Analysis};

const ENTRY_LEN: usize = 300;

/// Quiet bar: 0.06 body inside a 0.66 range, constant close.
fn quiet() -> Bar {
    Bar {
        open: 99.97,
        high: 100.33,
        low: 99.67,
        close: 100.03,
        volume: 1000.0,
    }
}

/// Narrow coil bar: 0.2 range around the same close.
fn coil() -> Bar {
    Bar {
        open: 99.99,
        high: 100.10,
        low: 99.90,
        close: 100.03,
        volume: 1000.0,
    }
}

/// A confirmed breakout bar closing well above the coil, at double volume.
fn thrust() -> Bar {
    Bar {
        open: 100.0,
        high: 101.0,
        low: 99.95,
        close: 100.9,
        volume: 2000.0,
    }
}

fn build_entry(bars: Vec<Bar>) -> Vec<common::Candle> {
    bars.into_iter()
        .enumerate()
        .map(|(i, b)| b.into_candle(i, Timeframe::M5))
        .collect()
}

fn context() -> Vec<common::Candle> {
    trending_series(200, 100.0, 0.1, Timeframe::H1)
}

/// Flat history, five narrow bars, then a confirmed breakout.
fn long_scenario() -> Vec<common::Candle> {
    let mut bars: Vec<Bar> = (0..ENTRY_LEN - 6).map(|_| quiet()).collect();
    bars.extend([coil(), coil(), coil(), coil(), coil(), thrust()]);
    build_entry(bars)
}

/// Alternating ±0.8 closes settle RSI near 50; the tail coils and breaks
/// out with a small gain, leaving RSI between the confirmation lines.
fn rsi_blocked_scenario() -> Vec<common::Candle> {
    let mut bars = Vec::with_capacity(ENTRY_LEN);
    for i in 0..ENTRY_LEN - 6 {
        let close = if i % 2 == 0 { 99.6 } else { 100.4 };
        bars.push(Bar {
            open: close - 0.05,
            high: close + 0.05,
            low: close - 0.65,
            close,
            volume: 1000.0,
        });
    }
    let coil = Bar {
        open: 99.98,
        high: 100.08,
        low: 99.88,
        close: 100.0,
        volume: 1000.0,
    };
    bars.extend([coil; 5]);
    bars.push(Bar {
        open: 100.02,
        high: 100.25,
        low: 99.97,
        close: 100.2,
        volume: 2000.0,
    });
    build_entry(bars)
}

#[test]
fn compressed_breakout_with_momentum_yields_long_signal() {
    let analysis = analyze(Timeframe::M5, long_scenario(), Timeframe::H1, context()).unwrap();

    assert!(analysis.compression.compressed);
    assert!(analysis.velocity.spike);

    let breakout = analysis.breakout.expect("breakout step should have run");
    assert_eq!(breakout.signal, Some(Direction::Long));
    assert!((breakout.range_high - 100.10).abs() < 1e-9);

    let signal = analysis.signal.expect("long signal expected");
    assert_eq!(signal.direction, Direction::Long);
    assert!((signal.entry_hint - 100.9).abs() < 1e-9);
    // Stop rides the breakout candle's low.
    assert!((signal.stop_hint - 99.95).abs() < 1e-9);
    assert!(analysis
        .rationale
        .iter()
        .any(|r| matches!(r, RationaleEntry::SignalEmitted { direction: Direction::Long, .. })));
}

#[test]
fn breakout_without_rsi_confirmation_yields_no_signal() {
    let analysis =
        analyze(Timeframe::M5, rsi_blocked_scenario(), Timeframe::H1, context()).unwrap();

    assert!(analysis.compression.compressed);
    assert!(analysis.velocity.spike);

    let breakout = analysis.breakout.expect("breakout step should have run");
    assert!(breakout.close > breakout.range_high);
    assert!(
        breakout.rsi > 45.0 && breakout.rsi < 55.0,
        "scenario should pin RSI near 50, got {}",
        breakout.rsi
    );
    assert!(matches!(
        breakout.reason,
        BreakoutReason::MomentumNotConfirmed { attempted: Direction::Long, .. }
    ));
    assert!(analysis.signal.is_none());
}

#[test]
fn no_compression_stops_the_cascade_before_breakout() {
    // Same thrust bar, but the five bars before it stay wide.
    let mut bars: Vec<Bar> = (0..ENTRY_LEN - 1).map(|_| quiet()).collect();
    bars.push(thrust());
    let analysis = analyze(Timeframe::M5, build_entry(bars), Timeframe::H1, context()).unwrap();

    assert!(!analysis.compression.compressed);
    assert!(analysis.breakout.is_none(), "breakout must not be evaluated");
    assert!(analysis.signal.is_none());
    assert!(analysis
        .rationale
        .iter()
        .any(|r| matches!(r, RationaleEntry::DetectionStopped { after: DetectionStage::Compression })));
}

#[test]
fn unconfirmed_volume_stops_the_cascade_however_far_price_breaks() {
    // Breakout bar at baseline volume: velocity ratio clears, volume doesn't.
    let mut bars: Vec<Bar> = (0..ENTRY_LEN - 6).map(|_| quiet()).collect();
    bars.extend([coil(), coil(), coil(), coil(), coil()]);
    bars.push(Bar { volume: 1000.0, ..thrust() });
    let analysis = analyze(Timeframe::M5, build_entry(bars), Timeframe::H1, context()).unwrap();

    assert!(analysis.compression.compressed);
    assert!(!analysis.velocity.spike);
    assert!(analysis.velocity.velocity_ratio > 2.5);
    assert!(analysis.velocity.volume_ratio < 1.5);
    assert!(analysis.breakout.is_none());
    assert!(analysis.signal.is_none());
    assert!(analysis
        .rationale
        .iter()
        .any(|r| matches!(r, RationaleEntry::DetectionStopped { after: DetectionStage::Velocity })));
}

#[test]
fn short_history_raises_insufficient_history_and_no_signal() {
    let entry = trending_series(150, 100.0, 0.1, Timeframe::M5);
    let err = analyze(Timeframe::M5, entry, Timeframe::H1, context()).unwrap_err();
    assert!(
        matches!(err, Error::InsufficientHistory { required: 210, got: 150, .. }),
        "got {err:?}"
    );
}

#[test]
fn analyze_is_idempotent_over_identical_input() {
    let entry = long_scenario();
    let ctx = context();

    let first: Analysis =
        analyze(Timeframe::M5, entry.clone(), Timeframe::H1, ctx.clone()).unwrap();
    let second: Analysis = analyze(Timeframe::M5, entry, Timeframe::H1, ctx).unwrap();

    assert_eq!(first.snapshot, second.snapshot);
    assert_eq!(first.compression, second.compression);
    assert_eq!(first.velocity, second.velocity);
    assert_eq!(first.breakout, second.breakout);
    assert_eq!(first.divergence, second.divergence);
    assert_eq!(first.signal, second.signal);
    assert_eq!(first.rationale, second.rationale);
}
