use async_trait::async_trait;

use crate::{Candle, OrderRequest, Position, Quote, Result, Timeframe};

/// Source of candle history and live quotes.
///
/// Candles come back oldest first with no gaps; a gapped or short series is
/// an `InsufficientHistory` error, never silently-padded data.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>>;

    async fn quote(&self, instrument: &str) -> Result<Quote>;
}

/// Account equity source, read once per sizing step.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn equity(&self) -> Result<f64>;
}

/// The broker/execution side.
///
/// Only the cycle runner in `crates/engine` should hold a
/// `dyn ExecutionGateway`; every order passes through sizing before reaching
/// it, and retries of a failed submission belong to the gateway, not here.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Submit an order and return the broker-assigned order id.
    async fn submit_order(&self, order: &OrderRequest) -> Result<String>;

    /// Close an open position by id.
    async fn submit_close(&self, position_id: &str) -> Result<()>;

    /// Open positions for one instrument, broker as source of truth.
    async fn open_positions(&self, instrument: &str) -> Result<Vec<Position>>;
}
