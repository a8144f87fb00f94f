use serde::{Deserialize, Serialize};

use common::{Direction, Error, InstrumentConfig, Quote, Result, Signal, SizedOrder, TakeProfitRule};

/// Reward multiple of the first take-profit: fixed 1.5:1 reward-to-risk.
pub const TP1_REWARD_MULTIPLE: f64 = 1.5;
/// Period of the fast EMA the second take-profit trails.
pub const TP2_FAST_EMA_PERIOD: usize = 9;

/// Process-wide risk configuration, immutable per run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Fraction of equity risked per trade (e.g. 0.02 = 2%).
    pub risk_fraction: f64,
    /// Account-currency value of one point of price movement per lot.
    pub point_value: f64,
    /// Minimum lot increment of the instrument.
    pub lot_step: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            risk_fraction: 0.02,
            point_value: 1.0,
            lot_step: 0.01,
        }
    }
}

impl From<&InstrumentConfig> for RiskParameters {
    fn from(cfg: &InstrumentConfig) -> Self {
        Self {
            risk_fraction: cfg.risk_fraction,
            point_value: cfg.point_value,
            lot_step: cfg.lot_step,
        }
    }
}

/// Convert a signal plus live quote and account equity into a concrete
/// order under the fixed-fractional risk rule.
///
/// This never submits anything; the returned value is for the execution
/// collaborator to act on. Re-running with the same inputs yields the same
/// order, so callers are free to retry the call without retrying the logic.
pub fn size(
    signal: &Signal,
    quote: Quote,
    equity: f64,
    params: &RiskParameters,
) -> Result<SizedOrder> {
    let entry = quote.entry_for(signal.direction);
    let stop_loss = signal.stop_hint;

    if stop_loss == entry {
        // A zero-distance stop would divide the risk by zero.
        return Err(Error::InvalidStop {
            entry,
            stop: stop_loss,
        });
    }

    let risk_amount = equity * params.risk_fraction;
    let stop_distance = (entry - stop_loss).abs();
    let volume = quantize(
        risk_amount / (stop_distance * params.point_value),
        params.lot_step,
    );

    let take_profit_1 = match signal.direction {
        Direction::Long => entry + TP1_REWARD_MULTIPLE * stop_distance,
        Direction::Short => entry - TP1_REWARD_MULTIPLE * stop_distance,
    };

    Ok(SizedOrder {
        direction: signal.direction,
        volume,
        entry,
        stop_loss,
        take_profit_1,
        take_profit_2: TakeProfitRule::TrailFastEma {
            period: TP2_FAST_EMA_PERIOD,
            value_at_signal: signal.fast_ema_at_signal,
        },
        risk_amount,
    })
}

/// Round the raw volume to the instrument's minimum lot increment.
fn quantize(volume: f64, step: f64) -> f64 {
    (volume / step).round() * step
}
