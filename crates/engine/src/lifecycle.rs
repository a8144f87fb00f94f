use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use common::{AccountService, Error, ExecutionGateway, InstrumentConfig, MarketData};

use crate::cycle::CycleRunner;

/// Current state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Stopped => write!(f, "stopped"),
            EngineState::Running => write!(f, "running"),
            EngineState::Paused => write!(f, "paused"),
        }
    }
}

/// Commands sent to the supervisor via the command channel.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Start,
    Stop,
    Pause,
    Resume,
}

/// Cloneable handle passed to the host process.
#[derive(Clone)]
pub struct SupervisorHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    state: Arc<RwLock<EngineState>>,
}

impl SupervisorHandle {
    pub async fn send(&self, cmd: EngineCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }
}

/// Owns the per-instrument cycle tasks: one timer-driven task per
/// configured instrument, started and stopped as a group.
///
/// Cancellation threads through the command channel and task aborts; there
/// are no process-wide interval handles to leak. Within one instrument the
/// cycle is strictly sequential: a tick never starts while the previous
/// cycle (including its order submission) is outstanding.
pub struct Supervisor {
    instruments: Vec<InstrumentConfig>,
    market_data: Arc<dyn MarketData>,
    account: Arc<dyn AccountService>,
    gateway: Arc<dyn ExecutionGateway>,
    state: Arc<RwLock<EngineState>>,
    command_rx: mpsc::Receiver<EngineCommand>,
}

impl Supervisor {
    pub fn new(
        instruments: Vec<InstrumentConfig>,
        market_data: Arc<dyn MarketData>,
        account: Arc<dyn AccountService>,
        gateway: Arc<dyn ExecutionGateway>,
    ) -> (Self, SupervisorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let state = Arc::new(RwLock::new(EngineState::Stopped));

        let handle = SupervisorHandle {
            command_tx,
            state: state.clone(),
        };

        let supervisor = Supervisor {
            instruments,
            market_data,
            account,
            gateway,
            state,
            command_rx,
        };

        (supervisor, handle)
    }

    /// Run the supervisor command loop. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!("Supervisor initialized in stopped state, waiting for start");

        let mut cycle_handles: Vec<tokio::task::JoinHandle<()>> = Vec::new();

        loop {
            match self.command_rx.recv().await {
                Some(EngineCommand::Start) => {
                    let current = *self.state.read().await;
                    if current == EngineState::Running {
                        info!("Supervisor already running");
                        continue;
                    }

                    info!(instruments = self.instruments.len(), "starting cycle tasks");
                    *self.state.write().await = EngineState::Running;

                    for instrument in &self.instruments {
                        let runner = CycleRunner::new(
                            instrument.clone(),
                            self.market_data.clone(),
                            self.account.clone(),
                            self.gateway.clone(),
                        );
                        let handle =
                            tokio::spawn(run_instrument_cycles(runner, self.state.clone()));
                        cycle_handles.push(handle);
                    }
                }

                Some(EngineCommand::Stop) => {
                    info!("Supervisor stopping, aborting cycle tasks");
                    *self.state.write().await = EngineState::Stopped;
                    for handle in cycle_handles.drain(..) {
                        handle.abort();
                    }
                }

                Some(EngineCommand::Pause) => {
                    let current = *self.state.read().await;
                    if current == EngineState::Running {
                        info!("Supervisor paused, ticks continue, cycles suppressed");
                        *self.state.write().await = EngineState::Paused;
                    }
                }

                Some(EngineCommand::Resume) => {
                    let current = *self.state.read().await;
                    if current == EngineState::Paused {
                        info!("Supervisor resumed");
                        *self.state.write().await = EngineState::Running;
                    }
                }

                None => {
                    warn!("Supervisor command channel closed, shutting down");
                    for handle in cycle_handles.drain(..) {
                        handle.abort();
                    }
                    break;
                }
            }
        }
    }
}

/// The per-instrument loop: tick, then run one full cycle to completion
/// before the next tick is honored.
async fn run_instrument_cycles(runner: CycleRunner, state: Arc<RwLock<EngineState>>) {
    let symbol = runner.instrument().symbol.clone();
    let mut ticker =
        tokio::time::interval(Duration::from_secs(runner.instrument().cycle_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(instrument = %symbol, "cycle task running");
    loop {
        ticker.tick().await;

        if *state.read().await != EngineState::Running {
            continue; // paused: keep ticking, run nothing
        }

        match runner.run_cycle().await {
            Ok(report) => {
                info!(
                    instrument = %symbol,
                    signal = report.analysis.signal.is_some(),
                    submitted = report.order_id.is_some(),
                    positions = report.decisions.len(),
                    "cycle complete"
                );
            }
            Err(Error::InsufficientHistory { timeframe, required, got }) => {
                info!(
                    instrument = %symbol,
                    timeframe = %timeframe,
                    required,
                    got,
                    "waiting for more history"
                );
            }
            Err(e) => {
                // A failed cycle produces no signal and no order.
                warn!(instrument = %symbol, error = %e, "cycle failed");
            }
        }
    }
}
