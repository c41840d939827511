//! Headless engine binary for the Ubiquity simulation.
//!
//! Loads configuration, seeds the scene, and drives the async runner
//! while two side tasks script the host: one broadcasts from the
//! orchestrator on a fixed cadence, the other logs a summary of the
//! latest snapshot.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ubiquity-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Seed the simulation from the configured world
//! 4. Open the command and snapshot channels
//! 5. Spawn the broadcaster and reporter tasks
//! 6. Run until the deadline or Ctrl-C
//! 7. Log the result

mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ubiquity_core::config::SimulationConfig;
use ubiquity_core::{Command, Simulation, SimulationSnapshot, runner};

use crate::error::EngineError;

const CONFIG_PATH: &str = "ubiquity-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration fails to load or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration comes first so the log level can be taken from it.
    let config = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        seed = config.world.seed,
        mode = %config.world.initial_mode,
        width = config.world.width,
        height = config.world.height,
        "Configuration loaded"
    );

    let engine = config.engine.clone();
    let mut sim = Simulation::new(config).map_err(EngineError::from)?;
    info!(
        nodes = sim.nodes().len(),
        objects = sim.objects().len(),
        "Scene seeded"
    );

    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel();
    let (snapshots_tx, snapshots_rx) = watch::channel(Arc::new(sim.snapshot()));

    if engine.broadcast_every_secs > 0 {
        let every = Duration::from_secs(engine.broadcast_every_secs);
        tokio::spawn(broadcast_loop(commands_tx.clone(), every));
    }
    if engine.report_every_secs > 0 {
        let every = Duration::from_secs(engine.report_every_secs);
        tokio::spawn(report_loop(snapshots_rx.clone(), every));
    }

    let run_for = (engine.run_secs > 0).then(|| Duration::from_secs(engine.run_secs));
    let summary = runner::run_simulation(
        &mut sim,
        &mut commands_rx,
        &snapshots_tx,
        run_for,
        shutdown_signal(),
    )
    .await
    .map_err(EngineError::from)?;

    runner::log_simulation_end(&summary);
    report(&snapshots_rx.borrow());

    // Keeps the command channel open until the run has ended.
    drop(commands_tx);
    info!(end_reason = ?summary.end_reason, "ubiquity-engine shutdown complete");

    Ok(())
}

/// Load the simulation configuration from `ubiquity-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(SimulationConfig::from_file(config_path)?)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// Resolve on Ctrl-C. If the handler cannot be installed, never resolve.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl-C handler, running until the deadline");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}

/// Queue a broadcast from the orchestrator every `every`.
async fn broadcast_loop(commands: mpsc::UnboundedSender<Command>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if commands.send(Command::Broadcast).is_err() {
            break;
        }
    }
}

/// Log the latest snapshot every `every` until the runner goes away.
async fn report_loop(mut snapshots: watch::Receiver<Arc<SimulationSnapshot>>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;
    loop {
        interval.tick().await;
        if snapshots.has_changed().is_err() {
            break;
        }
        let latest = Arc::clone(&snapshots.borrow_and_update());
        report(&latest);
    }
}

/// One structured log line summarizing a snapshot.
fn report(snapshot: &SimulationSnapshot) {
    let metrics = snapshot.field_metrics;
    info!(
        sim_time = snapshot.sim_time,
        mode = %snapshot.mode,
        wavefronts = snapshot.wavefronts.len(),
        mean_snr = snapshot.mean_snr(),
        signals = snapshot.signals.len(),
        warrants = snapshot.warrants.len(),
        triads = snapshot.triad_count,
        phase = metrics.phase.label(),
        breach_risk = metrics.breach_risk,
        locked_stake = snapshot.economic_bridge.locked_stake,
        dismissed = snapshot.warrant_lifecycle.dismissed,
        expired = snapshot.warrant_lifecycle.expired,
        "Snapshot"
    );
}
