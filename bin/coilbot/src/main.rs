use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, InstrumentFileConfig};
use engine::{EngineCommand, Supervisor};
use paper::{PaperBroker, ReplayFeed};

const INITIAL_PAPER_EQUITY: f64 = 10_000.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let instrument_file = InstrumentFileConfig::load(&cfg.instrument_config_path);
    info!(
        instruments = instrument_file.instruments.len(),
        candle_file = %cfg.candle_file,
        "coilbot starting"
    );

    // ── Collaborators (paper replay) ──────────────────────────────────────────
    let feed = Arc::new(
        ReplayFeed::load(&cfg.candle_file)
            .with_context(|| format!("loading candle file '{}'", cfg.candle_file))?,
    );
    let broker = Arc::new(PaperBroker::new(INITIAL_PAPER_EQUITY, feed.clone()));

    // ── Supervisor ────────────────────────────────────────────────────────────
    let (supervisor, handle) = Supervisor::new(
        instrument_file.instruments,
        feed,
        broker.clone(),
        broker,
    );
    tokio::spawn(supervisor.run());
    handle.send(EngineCommand::Start).await;

    info!("all subsystems started, waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    handle.send(EngineCommand::Stop).await;
    info!("shutdown signal received, exiting");
    Ok(())
}
