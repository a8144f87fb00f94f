pub mod indicators;
pub mod patterns;
pub mod rationale;
pub mod structure;
pub mod testdata;

pub use rationale::{DetectionStage, RationaleEntry};
pub use structure::{StructureSnapshot, CONTEXT_MIN_BARS, ENTRY_MIN_BARS};

use common::{Candle, Direction, DivergenceKind, Result, Signal, Timeframe};

use patterns::{
    confirm_breakout, detect_compression, detect_divergence, detect_velocity_spike,
    BreakoutResult, CompressionResult, Divergence, VelocityResult,
};

/// Everything one analysis cycle decided, with the structured trace of why.
///
/// `breakout` is `None` when the compression/velocity gates never let the
/// breakout step run; `signal` is present only when all three detectors
/// agreed on a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub snapshot: StructureSnapshot,
    pub compression: CompressionResult,
    pub velocity: VelocityResult,
    pub breakout: Option<BreakoutResult>,
    pub divergence: Option<Divergence>,
    pub signal: Option<Signal>,
    pub rationale: Vec<RationaleEntry>,
}

impl Analysis {
    pub fn divergence_kind(&self) -> Option<DivergenceKind> {
        self.divergence.map(|d| d.kind)
    }
}

/// Run one full detection cycle over freshly fetched candle series.
///
/// Deterministic and side-effect free: identical input always yields an
/// identical `Analysis`, so a caller may retry the surrounding calls
/// without retrying the logic. A failed cycle returns an error and nothing
/// else, never a signal with a partially computed rationale.
pub fn analyze(
    entry_timeframe: Timeframe,
    entry: Vec<Candle>,
    context_timeframe: Timeframe,
    context: Vec<Candle>,
) -> Result<Analysis> {
    let snapshot = StructureSnapshot::build(entry_timeframe, entry, context_timeframe, context)?;
    analyze_snapshot(snapshot)
}

/// The detection cascade over an already-built snapshot.
///
/// Compression and velocity are evaluated unconditionally (both are
/// direction-blind); the breakout step runs only when both gates clear.
pub fn analyze_snapshot(snapshot: StructureSnapshot) -> Result<Analysis> {
    let mut rationale = Vec::new();

    let compression = detect_compression(&snapshot)?;
    rationale.push(RationaleEntry::CompressionEvaluated {
        compressed: compression.compressed,
        narrow_count: compression.narrow_count,
        lookback: compression.lookback,
        atr: compression.atr,
    });

    let velocity = detect_velocity_spike(&snapshot)?;
    rationale.push(RationaleEntry::VelocityEvaluated {
        spike: velocity.spike,
        velocity_ratio: velocity.velocity_ratio,
        volume_ratio: velocity.volume_ratio,
    });

    let divergence = detect_divergence(&snapshot);
    if let Some(d) = &divergence {
        rationale.push(RationaleEntry::DivergenceDetected {
            kind: d.kind,
            extreme_price: d.extreme_price,
        });
    }

    let breakout = if !compression.compressed {
        rationale.push(RationaleEntry::DetectionStopped {
            after: DetectionStage::Compression,
        });
        None
    } else if !velocity.spike {
        rationale.push(RationaleEntry::DetectionStopped {
            after: DetectionStage::Velocity,
        });
        None
    } else {
        let result = confirm_breakout(&snapshot)?;
        rationale.push(RationaleEntry::BreakoutEvaluated {
            signal: result.signal,
            range_high: result.range_high,
            range_low: result.range_low,
            close: result.close,
            rsi: result.rsi,
        });
        Some(result)
    };

    let signal = match breakout.as_ref().and_then(|b| b.signal) {
        Some(direction) => {
            let candle = snapshot.current_candle();
            let stop_hint = match direction {
                Direction::Long => candle.low,
                Direction::Short => candle.high,
            };
            let signal = Signal {
                direction,
                entry_hint: candle.close,
                stop_hint,
                signal_index: snapshot.current,
                fast_ema_at_signal: snapshot.ema9_at_current()?,
            };
            rationale.push(RationaleEntry::SignalEmitted {
                direction,
                entry_hint: signal.entry_hint,
                stop_hint: signal.stop_hint,
            });
            Some(signal)
        }
        None => None,
    };

    Ok(Analysis {
        snapshot,
        compression,
        velocity,
        breakout,
        divergence,
        signal,
        rationale,
    })
}
