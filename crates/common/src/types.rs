use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One closed OHLCV bar. Candle series are always ordered oldest first,
/// one series per timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Full high-to-low extent of the bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute open-to-close body of the bar.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// OHLC invariant: the high bounds every other price, the low is bounded
    /// by every other price.
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.open.max(self.close).max(self.low)
            && self.low <= self.open.min(self.close).min(self.high)
            && self.volume >= 0.0
    }
}

/// Validate a candle series against the contract of the market data source:
/// at least `required` bars, well-formed OHLC, strictly increasing timestamps
/// with no gaps at the timeframe's spacing.
///
/// A short or gapped series is `InsufficientHistory` (wait and retry); a
/// malformed candle rejects the whole batch as `MalformedCandle`; no partial
/// repair is attempted.
pub fn validate_series(candles: &[Candle], timeframe: Timeframe, required: usize) -> Result<()> {
    if candles.len() < required {
        return Err(Error::InsufficientHistory {
            timeframe,
            required,
            got: candles.len(),
        });
    }

    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_well_formed() {
            return Err(Error::MalformedCandle {
                index,
                detail: format!(
                    "OHLC invariant violated: o={} h={} l={} c={}",
                    candle.open, candle.high, candle.low, candle.close
                ),
            });
        }
    }

    let step = timeframe.duration();
    for (i, pair) in candles.windows(2).enumerate() {
        let gap = pair[1].timestamp - pair[0].timestamp;
        if gap <= chrono::Duration::zero() {
            return Err(Error::MalformedCandle {
                index: i + 1,
                detail: "timestamps not strictly increasing".into(),
            });
        }
        if gap != step {
            // A gap truncates usable history to the contiguous tail.
            return Err(Error::InsufficientHistory {
                timeframe,
                required,
                got: candles.len() - i - 1,
            });
        }
    }

    Ok(())
}

/// Candle timeframe. The engine runs on a fast "entry" timeframe and a
/// slower "context" timeframe per instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn duration(&self) -> chrono::Duration {
        match self {
            Timeframe::M1 => chrono::Duration::minutes(1),
            Timeframe::M5 => chrono::Duration::minutes(5),
            Timeframe::M15 => chrono::Duration::minutes(15),
            Timeframe::M30 => chrono::Duration::minutes(30),
            Timeframe::H1 => chrono::Duration::hours(1),
            Timeframe::H4 => chrono::Duration::hours(4),
            Timeframe::D1 => chrono::Duration::days(1),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Timeframe::M1 => "m1",
            Timeframe::M5 => "m5",
            Timeframe::M15 => "m15",
            Timeframe::M30 => "m30",
            Timeframe::H1 => "h1",
            Timeframe::H4 => "h4",
            Timeframe::D1 => "d1",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "m1" => Ok(Timeframe::M1),
            "m5" => Ok(Timeframe::M5),
            "m15" => Ok(Timeframe::M15),
            "m30" => Ok(Timeframe::M30),
            "h1" => Ok(Timeframe::H1),
            "h4" => Ok(Timeframe::H4),
            "d1" => Ok(Timeframe::D1),
            other => Err(Error::Config(format!("unknown timeframe '{other}'"))),
        }
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// Trend bias derived per timeframe from the EMA20/EMA200 relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendBias {
    Bullish,
    Bearish,
}

impl std::fmt::Display for TrendBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendBias::Bullish => write!(f, "bullish"),
            TrendBias::Bearish => write!(f, "bearish"),
        }
    }
}

/// Current best bid/ask for an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    /// The price a new position in `direction` would enter at: longs lift
    /// the ask, shorts hit the bid.
    pub fn entry_for(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Long => self.ask,
            Direction::Short => self.bid,
        }
    }
}

/// Read-only view of an open position. The broker is the source of truth;
/// the engine only reads these and recommends actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub volume: f64,
    pub opened_at: DateTime<Utc>,
}

/// A detected entry opportunity, produced only when compression, velocity
/// spike and breakout confirmation all agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    /// Close of the breakout candle; the quoted entry will differ slightly.
    pub entry_hint: f64,
    /// Low of the breakout candle for longs, high for shorts.
    pub stop_hint: f64,
    /// Index of the breakout candle within the entry-timeframe series.
    pub signal_index: usize,
    /// EMA9 value at the signal index, the anchor of the trailing TP2 rule.
    pub fast_ema_at_signal: f64,
}

/// Rule for the second take-profit. TP2 is not a fixed price; the holder
/// re-reads the fast EMA every monitoring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TakeProfitRule {
    TrailFastEma { period: usize, value_at_signal: f64 },
}

/// A fully sized order, ready for the execution gateway. Sizing never
/// submits; this is a value handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizedOrder {
    pub direction: Direction,
    pub volume: f64,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: TakeProfitRule,
    pub risk_amount: f64,
}

/// Order submission request (the SubmitOrder contract of the execution
/// gateway). `id` is generated client-side so retries stay idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: String,
    pub instrument: String,
    pub direction: Direction,
    pub volume: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub label: String,
}

impl OrderRequest {
    pub fn from_sized(
        order: &SizedOrder,
        instrument: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            instrument: instrument.into(),
            direction: order.direction,
            volume: order.volume,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit_1,
            label: label.into(),
        }
    }
}

/// What the monitor recommends for one open position this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorAction {
    Hold,
    Warn,
    Close,
}

impl std::fmt::Display for MonitorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorAction::Hold => write!(f, "hold"),
            MonitorAction::Warn => write!(f, "warn"),
            MonitorAction::Close => write!(f, "close"),
        }
    }
}

/// Which divergence was seen. Labels follow the detector: a new price high
/// with unconfirming velocity is `Bullish`, a new low `Bearish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceKind {
    Bullish,
    Bearish,
}

impl std::fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DivergenceKind::Bullish => write!(f, "bullish"),
            DivergenceKind::Bearish => write!(f, "bearish"),
        }
    }
}

/// Structured grounds for a monitor decision. Rendered to text only at the
/// presentation boundary; tests assert on the fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MonitorReason {
    LossLimitBreached { pnl_percent: f64 },
    MomentumDivergence { kind: DivergenceKind },
    WithinLimits { pnl_percent: f64 },
}

impl std::fmt::Display for MonitorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorReason::LossLimitBreached { pnl_percent } => {
                write!(f, "loss limit breached at {pnl_percent:.2}%")
            }
            MonitorReason::MomentumDivergence { kind } => {
                write!(f, "{kind} momentum divergence")
            }
            MonitorReason::WithinLimits { pnl_percent } => {
                write!(f, "within limits at {pnl_percent:.2}%")
            }
        }
    }
}

/// Per-position verdict for one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorDecision {
    pub position_id: String,
    pub action: MonitorAction,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub reason: MonitorReason,
}
