use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use common::{
    AccountService, Error, ExecutionGateway, InstrumentConfig, MarketData, MonitorAction,
    MonitorDecision, OrderRequest, Result, Signal, UpstreamCall,
};
use risk::{monitor, size, RiskParameters};
use strategy::{analyze, Analysis, CONTEXT_MIN_BARS, ENTRY_MIN_BARS};

// Client-side bounds on collaborator calls. A stalled upstream must not
// block monitoring of other instruments' cycles.
const CANDLES_TIMEOUT: Duration = Duration::from_secs(15);
const QUOTE_TIMEOUT: Duration = Duration::from_secs(5);
const EQUITY_TIMEOUT: Duration = Duration::from_secs(5);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
const POSITIONS_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(30);

/// What one completed cycle produced.
#[derive(Debug)]
pub struct CycleReport {
    pub analysis: Analysis,
    /// Broker order id when this cycle's signal was sized and submitted.
    pub order_id: Option<String>,
    pub decisions: Vec<MonitorDecision>,
}

/// Drives the full per-instrument pipeline each cycle, strictly ordered:
/// structure -> detect -> (size -> submit) -> monitor.
///
/// This is the only component that talks to the execution gateway. Retries
/// of failed upstream calls belong to the collaborators; the runner itself
/// is deterministic given the same fetched data.
pub struct CycleRunner {
    instrument: InstrumentConfig,
    risk: RiskParameters,
    market_data: Arc<dyn MarketData>,
    account: Arc<dyn AccountService>,
    gateway: Arc<dyn ExecutionGateway>,
}

impl CycleRunner {
    pub fn new(
        instrument: InstrumentConfig,
        market_data: Arc<dyn MarketData>,
        account: Arc<dyn AccountService>,
        gateway: Arc<dyn ExecutionGateway>,
    ) -> Self {
        let risk = RiskParameters::from(&instrument);
        Self {
            instrument,
            risk,
            market_data,
            account,
            gateway,
        }
    }

    pub fn instrument(&self) -> &InstrumentConfig {
        &self.instrument
    }

    /// One full cycle. The caller must not start another cycle for the same
    /// instrument while this one is outstanding; that is what keeps one
    /// detected signal from producing duplicate orders.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let symbol = self.instrument.symbol.clone();

        let entry = bounded(
            CANDLES_TIMEOUT,
            UpstreamCall::Candles,
            self.market_data
                .candles(&symbol, self.instrument.entry_timeframe, ENTRY_MIN_BARS),
        )
        .await?;
        let context = bounded(
            CANDLES_TIMEOUT,
            UpstreamCall::Candles,
            self.market_data
                .candles(&symbol, self.instrument.context_timeframe, CONTEXT_MIN_BARS),
        )
        .await?;

        let analysis = analyze(
            self.instrument.entry_timeframe,
            entry,
            self.instrument.context_timeframe,
            context,
        )?;
        self.log_rationale(&analysis);

        let order_id = match analysis.signal {
            Some(signal) => self.place_order(&signal).await?,
            None => None,
        };

        let positions = bounded(
            POSITIONS_TIMEOUT,
            UpstreamCall::OpenPositions,
            self.gateway.open_positions(&symbol),
        )
        .await?;

        let decisions = monitor(
            &positions,
            analysis.snapshot.current_candle().close,
            analysis.divergence_kind(),
        );
        self.act_on_decisions(&decisions).await?;

        Ok(CycleReport {
            analysis,
            order_id,
            decisions,
        })
    }

    /// Size the signal against a fresh quote and equity, then submit.
    /// An `InvalidStop` rejects the signal without failing the cycle.
    async fn place_order(&self, signal: &Signal) -> Result<Option<String>> {
        let symbol = &self.instrument.symbol;

        let quote = bounded(
            QUOTE_TIMEOUT,
            UpstreamCall::Quote,
            self.market_data.quote(symbol),
        )
        .await?;
        let equity = bounded(EQUITY_TIMEOUT, UpstreamCall::Equity, self.account.equity()).await?;

        let sized = match size(signal, quote, equity, &self.risk) {
            Ok(sized) => sized,
            Err(Error::InvalidStop { entry, stop }) => {
                warn!(
                    instrument = %symbol,
                    entry,
                    stop,
                    "signal rejected: zero-distance stop"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let request =
            OrderRequest::from_sized(&sized, symbol.as_str(), self.instrument.label.as_str());
        let order_id = bounded(
            SUBMIT_TIMEOUT,
            UpstreamCall::SubmitOrder,
            self.gateway.submit_order(&request),
        )
        .await?;

        info!(
            instrument = %symbol,
            direction = %sized.direction,
            volume = sized.volume,
            stop_loss = sized.stop_loss,
            take_profit = sized.take_profit_1,
            order_id = %order_id,
            "order submitted"
        );
        Ok(Some(order_id))
    }

    async fn act_on_decisions(&self, decisions: &[MonitorDecision]) -> Result<()> {
        for decision in decisions {
            match decision.action {
                MonitorAction::Close => {
                    warn!(
                        instrument = %self.instrument.symbol,
                        position = %decision.position_id,
                        pnl = decision.pnl,
                        pnl_percent = decision.pnl_percent,
                        reason = %decision.reason,
                        "closing position"
                    );
                    bounded(
                        CLOSE_TIMEOUT,
                        UpstreamCall::SubmitClose,
                        self.gateway.submit_close(&decision.position_id),
                    )
                    .await?;
                }
                MonitorAction::Warn => {
                    warn!(
                        instrument = %self.instrument.symbol,
                        position = %decision.position_id,
                        pnl = decision.pnl,
                        reason = %decision.reason,
                        "position warning"
                    );
                }
                MonitorAction::Hold => {
                    info!(
                        instrument = %self.instrument.symbol,
                        position = %decision.position_id,
                        pnl = decision.pnl,
                        pnl_percent = decision.pnl_percent,
                        "position held"
                    );
                }
            }
        }
        Ok(())
    }

    /// The structured trace, rendered to log lines at this boundary only.
    fn log_rationale(&self, analysis: &Analysis) {
        for entry in &analysis.rationale {
            info!(instrument = %self.instrument.symbol, step = %entry, "rationale");
        }
    }
}

/// Wrap a collaborator call in a client-side timeout, surfacing expiry as
/// an `Upstream` error naming the originating call.
async fn bounded<T>(
    limit: Duration,
    call: UpstreamCall,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Upstream {
            call,
            message: format!("timed out after {}s", limit.as_secs()),
        }),
    }
}
