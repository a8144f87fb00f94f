use serde::Serialize;

use common::{Direction, DivergenceKind};

/// Which gate ended the detection cascade early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectionStage {
    Compression,
    Velocity,
    Breakout,
}

impl std::fmt::Display for DetectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionStage::Compression => write!(f, "compression"),
            DetectionStage::Velocity => write!(f, "velocity"),
            DetectionStage::Breakout => write!(f, "breakout"),
        }
    }
}

/// One step of the replayable decision trace.
///
/// Rationale is structured data, not formatted text: tests assert on the
/// fields, and rendering happens only at the presentation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RationaleEntry {
    CompressionEvaluated {
        compressed: bool,
        narrow_count: usize,
        lookback: usize,
        atr: f64,
    },
    VelocityEvaluated {
        spike: bool,
        velocity_ratio: f64,
        volume_ratio: f64,
    },
    BreakoutEvaluated {
        signal: Option<Direction>,
        range_high: f64,
        range_low: f64,
        close: f64,
        rsi: f64,
    },
    DivergenceDetected {
        kind: DivergenceKind,
        extreme_price: f64,
    },
    SignalEmitted {
        direction: Direction,
        entry_hint: f64,
        stop_hint: f64,
    },
    DetectionStopped {
        after: DetectionStage,
    },
}

impl std::fmt::Display for RationaleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RationaleEntry::CompressionEvaluated { compressed, narrow_count, lookback, atr } => {
                write!(
                    f,
                    "compression: {narrow_count}/{lookback} narrow vs atr {atr:.5} -> {}",
                    if *compressed { "coiled" } else { "not coiled" }
                )
            }
            RationaleEntry::VelocityEvaluated { spike, velocity_ratio, volume_ratio } => {
                write!(
                    f,
                    "velocity: body x{velocity_ratio:.2}, volume x{volume_ratio:.2} -> {}",
                    if *spike { "spike" } else { "no spike" }
                )
            }
            RationaleEntry::BreakoutEvaluated { signal, range_high, range_low, close, rsi } => {
                match signal {
                    Some(direction) => write!(
                        f,
                        "breakout: close {close:.5} vs range [{range_low:.5}, {range_high:.5}], rsi {rsi:.1} -> {direction}"
                    ),
                    None => write!(
                        f,
                        "breakout: close {close:.5} vs range [{range_low:.5}, {range_high:.5}], rsi {rsi:.1} -> none"
                    ),
                }
            }
            RationaleEntry::DivergenceDetected { kind, extreme_price } => {
                write!(f, "divergence: {kind} at {extreme_price:.5}")
            }
            RationaleEntry::SignalEmitted { direction, entry_hint, stop_hint } => {
                write!(f, "signal: {direction} entry~{entry_hint:.5} stop~{stop_hint:.5}")
            }
            RationaleEntry::DetectionStopped { after } => {
                write!(f, "stopped after {after} gate")
            }
        }
    }
}
