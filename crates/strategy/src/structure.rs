use common::{types::validate_series, Candle, Error, Result, Timeframe, TrendBias};

use crate::indicators::{
    atr, bollinger, candle_velocity, ema, rsi, sma, velocity_average, BollingerPoint,
};

/// EMA200 warmup plus a 10-bar buffer.
pub const ENTRY_MIN_BARS: usize = 210;
/// EMA200 warmup on the context timeframe.
pub const CONTEXT_MIN_BARS: usize = 200;

/// Immutable per-cycle bundle of both candle series, every entry-timeframe
/// indicator, and the trend bias of each timeframe.
///
/// Built fresh from freshly fetched candles each analysis cycle, never
/// mutated, only replaced. Every downstream detector assumes fully warmed
/// indicators at [`StructureSnapshot::current`], which is why the history
/// minimums are hard preconditions.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSnapshot {
    pub entry_timeframe: Timeframe,
    pub context_timeframe: Timeframe,
    pub entry: Vec<Candle>,
    pub context: Vec<Candle>,

    pub ema9: Vec<Option<f64>>,
    pub ema20: Vec<Option<f64>>,
    pub ema200: Vec<Option<f64>>,
    pub atr14: Vec<Option<f64>>,
    pub bollinger: Vec<Option<BollingerPoint>>,
    pub rsi14: Vec<Option<f64>>,
    pub volume_sma20: Vec<Option<f64>>,
    pub velocity: Vec<f64>,
    pub velocity_avg: Vec<Option<f64>>,

    pub entry_bias: TrendBias,
    pub context_bias: TrendBias,

    /// Index of the most recent closed entry-timeframe candle.
    pub current: usize,
}

impl StructureSnapshot {
    /// Build the snapshot for one cycle.
    ///
    /// Fails with `InsufficientHistory` when either series is below its
    /// minimum and with `MalformedCandle` when a batch violates the OHLC or
    /// ordering invariant. A failed build produces nothing downstream.
    pub fn build(
        entry_timeframe: Timeframe,
        entry: Vec<Candle>,
        context_timeframe: Timeframe,
        context: Vec<Candle>,
    ) -> Result<Self> {
        validate_series(&entry, entry_timeframe, ENTRY_MIN_BARS)?;
        validate_series(&context, context_timeframe, CONTEXT_MIN_BARS)?;

        let closes: Vec<f64> = entry.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = entry.iter().map(|c| c.volume).collect();
        let context_closes: Vec<f64> = context.iter().map(|c| c.close).collect();

        let ema9 = ema(&closes, 9);
        let ema20 = ema(&closes, 20);
        let ema200 = ema(&closes, 200);
        let atr14 = atr(&entry, 14);
        let bands = bollinger(&closes, 20, 2.0);
        let rsi14 = rsi(&closes, 14);
        let volume_sma20 = sma(&volumes, 20);
        let velocity = candle_velocity(&entry);
        let velocity_avg = velocity_average(&velocity);

        let entry_bias = bias_at_latest(&ema20, &ema200, entry_timeframe, entry.len())?;
        let context_ema20 = ema(&context_closes, 20);
        let context_ema200 = ema(&context_closes, 200);
        let context_bias = bias_at_latest(
            &context_ema20,
            &context_ema200,
            context_timeframe,
            context.len(),
        )?;

        let current = entry.len() - 1;

        Ok(Self {
            entry_timeframe,
            context_timeframe,
            entry,
            context,
            ema9,
            ema20,
            ema200,
            atr14,
            bollinger: bands,
            rsi14,
            volume_sma20,
            velocity,
            velocity_avg,
            entry_bias,
            context_bias,
            current,
        })
    }

    /// The most recent closed entry-timeframe candle.
    pub fn current_candle(&self) -> &Candle {
        &self.entry[self.current]
    }

    pub fn atr_at_current(&self) -> Result<f64> {
        self.defined_at_current(&self.atr14)
    }

    pub fn rsi_at_current(&self) -> Result<f64> {
        self.defined_at_current(&self.rsi14)
    }

    pub fn ema9_at_current(&self) -> Result<f64> {
        self.defined_at_current(&self.ema9)
    }

    pub fn volume_sma_at_current(&self) -> Result<f64> {
        self.defined_at_current(&self.volume_sma20)
    }

    pub fn velocity_avg_at_current(&self) -> Result<f64> {
        self.defined_at_current(&self.velocity_avg)
    }

    /// An undefined indicator at the evaluation index is itself an
    /// `InsufficientHistory` condition, never a defaulted number.
    fn defined_at_current(&self, series: &[Option<f64>]) -> Result<f64> {
        series
            .get(self.current)
            .copied()
            .flatten()
            .ok_or(Error::InsufficientHistory {
                timeframe: self.entry_timeframe,
                required: ENTRY_MIN_BARS,
                got: self.entry.len(),
            })
    }
}

/// `bullish` iff EMA20 > EMA200 at the latest index.
fn bias_at_latest(
    ema20: &[Option<f64>],
    ema200: &[Option<f64>],
    timeframe: Timeframe,
    bars: usize,
) -> Result<TrendBias> {
    let fast = ema20.last().copied().flatten();
    let slow = ema200.last().copied().flatten();
    match (fast, slow) {
        (Some(fast), Some(slow)) => Ok(if fast > slow {
            TrendBias::Bullish
        } else {
            TrendBias::Bearish
        }),
        _ => Err(Error::InsufficientHistory {
            timeframe,
            required: CONTEXT_MIN_BARS,
            got: bars,
        }),
    }
}
