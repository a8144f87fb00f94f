use common::{
    Direction, DivergenceKind, MonitorAction, MonitorDecision, MonitorReason, Position,
};

/// Unrealized loss (as a percent of entry) past which the monitor demands a
/// close, a software-level safety net independent of the resting stop-loss
/// order.
pub const LOSS_LIMIT_PERCENT: f64 = -2.0;

/// Evaluate every open position against the latest cycle's market view.
///
/// Pure and stateless: everything needed is re-derived from the snapshot
/// each cycle, so identical inputs always produce identical decisions.
/// `current_price` is the close of the snapshot's current candle and
/// `divergence` is the cycle's momentum-divergence side-check, if any.
///
/// A divergence of either kind downgrades Hold to Warn: it is an
/// early-exit signal, not an immediate close.
pub fn monitor(
    positions: &[Position],
    current_price: f64,
    divergence: Option<DivergenceKind>,
) -> Vec<MonitorDecision> {
    positions
        .iter()
        .filter(|p| p.entry_price > 0.0)
        .map(|position| decide(position, current_price, divergence))
        .collect()
}

fn decide(
    position: &Position,
    current_price: f64,
    divergence: Option<DivergenceKind>,
) -> MonitorDecision {
    let entry = position.entry_price;
    let pnl = match position.direction {
        Direction::Long => (current_price - entry) * position.volume,
        Direction::Short => (entry - current_price) * position.volume,
    };
    let pnl_percent = pnl / entry * 100.0;

    let (action, reason) = if pnl_percent < LOSS_LIMIT_PERCENT {
        (
            MonitorAction::Close,
            MonitorReason::LossLimitBreached { pnl_percent },
        )
    } else if let Some(kind) = divergence {
        (
            MonitorAction::Warn,
            MonitorReason::MomentumDivergence { kind },
        )
    } else {
        (
            MonitorAction::Hold,
            MonitorReason::WithinLimits { pnl_percent },
        )
    };

    MonitorDecision {
        position_id: position.id.clone(),
        action,
        pnl,
        pnl_percent,
        reason,
    }
}
