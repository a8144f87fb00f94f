//! In-process collaborators for simulation and tests: a candle replay feed
//! and a paper broker. No real market data or orders are ever touched.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{
    AccountService, Candle, Direction, Error, ExecutionGateway, MarketData, OrderRequest,
    Position, Quote, Result, Timeframe, UpstreamCall,
};

/// Market data served from in-memory candle series with a movable replay
/// cursor per timeframe.
///
/// `candles` returns the last `count` bars of the visible prefix; a window
/// shorter than requested surfaces as `InsufficientHistory`; the feed
/// never pads.
pub struct ReplayFeed {
    instrument: String,
    spread: f64,
    series: HashMap<Timeframe, Vec<Candle>>,
    visible: RwLock<HashMap<Timeframe, usize>>,
}

/// On-disk replay file: `{ "instrument": ..., "spread": ..., "series": { "m5": [...] } }`.
#[derive(Deserialize)]
struct ReplayFile {
    instrument: String,
    #[serde(default)]
    spread: f64,
    series: HashMap<Timeframe, Vec<Candle>>,
}

impl ReplayFeed {
    pub fn new(instrument: impl Into<String>, spread: f64) -> Self {
        Self {
            instrument: instrument.into(),
            spread,
            series: HashMap::new(),
            visible: RwLock::new(HashMap::new()),
        }
    }

    /// Load series from a JSON replay file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read candle file '{path}': {e}")))?;
        let file: ReplayFile = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse candle file '{path}': {e}")))?;

        let mut feed = Self::new(file.instrument, file.spread);
        for (timeframe, candles) in file.series {
            feed = feed.with_series(timeframe, candles);
        }
        Ok(feed)
    }

    /// Attach a full series for one timeframe; the whole series starts
    /// visible.
    pub fn with_series(mut self, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        self.visible
            .get_mut()
            .insert(timeframe, candles.len());
        self.series.insert(timeframe, candles);
        self
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Move the replay cursor back so only `visible` bars can be seen.
    pub async fn rewind_to(&self, timeframe: Timeframe, visible: usize) {
        let limit = self.series.get(&timeframe).map_or(0, Vec::len);
        self.visible
            .write()
            .await
            .insert(timeframe, visible.min(limit));
    }

    /// Reveal `bars` more candles on one timeframe.
    pub async fn advance(&self, timeframe: Timeframe, bars: usize) {
        let limit = self.series.get(&timeframe).map_or(0, Vec::len);
        let mut visible = self.visible.write().await;
        let current = visible.get(&timeframe).copied().unwrap_or(0);
        visible.insert(timeframe, (current + bars).min(limit));
    }

    /// The fastest timeframe loaded; quotes are derived from it.
    fn quote_timeframe(&self) -> Option<Timeframe> {
        self.series
            .keys()
            .copied()
            .min_by_key(|tf| tf.duration().num_seconds())
    }
}

#[async_trait]
impl MarketData for ReplayFeed {
    async fn candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>> {
        if instrument != self.instrument {
            return Err(Error::Upstream {
                call: UpstreamCall::Candles,
                message: format!("no replay data for instrument '{instrument}'"),
            });
        }
        let series = self.series.get(&timeframe).ok_or_else(|| Error::Upstream {
            call: UpstreamCall::Candles,
            message: format!("no {timeframe} series loaded"),
        })?;

        let visible = self
            .visible
            .read()
            .await
            .get(&timeframe)
            .copied()
            .unwrap_or(0);
        if visible < count {
            return Err(Error::InsufficientHistory {
                timeframe,
                required: count,
                got: visible,
            });
        }
        Ok(series[visible - count..visible].to_vec())
    }

    async fn quote(&self, instrument: &str) -> Result<Quote> {
        if instrument != self.instrument {
            return Err(Error::Upstream {
                call: UpstreamCall::Quote,
                message: format!("no replay data for instrument '{instrument}'"),
            });
        }
        let timeframe = self.quote_timeframe().ok_or_else(|| Error::Upstream {
            call: UpstreamCall::Quote,
            message: "no candle series loaded".into(),
        })?;

        let visible = self
            .visible
            .read()
            .await
            .get(&timeframe)
            .copied()
            .unwrap_or(0);
        let last = visible
            .checked_sub(1)
            .and_then(|i| self.series[&timeframe].get(i))
            .ok_or_else(|| Error::Upstream {
                call: UpstreamCall::Quote,
                message: "no visible candles to quote from".into(),
            })?;

        let half_spread = self.spread / 2.0;
        Ok(Quote {
            bid: last.close - half_spread,
            ask: last.close + half_spread,
        })
    }
}

/// Simulated broker and account: fills at the replayed quote, keeps the
/// position ledger in memory, and marks equity to market on demand.
pub struct PaperBroker {
    cash: RwLock<f64>,
    positions: RwLock<Vec<Position>>,
    feed: Arc<ReplayFeed>,
}

impl PaperBroker {
    pub fn new(initial_equity: f64, feed: Arc<ReplayFeed>) -> Self {
        info!(equity = initial_equity, "PaperBroker initialized");
        Self {
            cash: RwLock::new(initial_equity),
            positions: RwLock::new(Vec::new()),
            feed,
        }
    }

    /// Exit price for a position at the current quote: longs sell the bid,
    /// shorts buy back the ask.
    fn exit_price(direction: Direction, quote: Quote) -> f64 {
        match direction {
            Direction::Long => quote.bid,
            Direction::Short => quote.ask,
        }
    }

    fn unrealized(position: &Position, quote: Quote) -> f64 {
        let exit = Self::exit_price(position.direction, quote);
        match position.direction {
            Direction::Long => (exit - position.entry_price) * position.volume,
            Direction::Short => (position.entry_price - exit) * position.volume,
        }
    }
}

#[async_trait]
impl ExecutionGateway for PaperBroker {
    async fn submit_order(&self, order: &OrderRequest) -> Result<String> {
        let quote = self.feed.quote(&order.instrument).await?;
        let fill_price = quote.entry_for(order.direction);

        debug!(
            instrument = %order.instrument,
            direction = %order.direction,
            volume = order.volume,
            fill = fill_price,
            label = %order.label,
            "paper fill simulated"
        );

        self.positions.write().await.push(Position {
            id: order.id.clone(),
            instrument: order.instrument.clone(),
            direction: order.direction,
            entry_price: fill_price,
            volume: order.volume,
            opened_at: Utc::now(),
        });

        Ok(order.id.clone())
    }

    async fn submit_close(&self, position_id: &str) -> Result<()> {
        let mut positions = self.positions.write().await;
        let index = positions
            .iter()
            .position(|p| p.id == position_id)
            .ok_or_else(|| Error::Upstream {
                call: UpstreamCall::SubmitClose,
                message: format!("unknown position '{position_id}'"),
            })?;
        let position = positions.remove(index);
        drop(positions);

        let quote = self.feed.quote(&position.instrument).await?;
        let realized = Self::unrealized(&position, quote);
        *self.cash.write().await += realized;

        debug!(
            position = %position.id,
            realized,
            "paper position closed"
        );
        Ok(())
    }

    async fn open_positions(&self, instrument: &str) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .read()
            .await
            .iter()
            .filter(|p| p.instrument == instrument)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountService for PaperBroker {
    async fn equity(&self) -> Result<f64> {
        let mut equity = *self.cash.read().await;
        for position in self.positions.read().await.iter() {
            let quote = self.feed.quote(&position.instrument).await?;
            equity += Self::unrealized(position, quote);
        }
        Ok(equity)
    }
}
