//! Async driver for the simulation.
//!
//! [`run_simulation`] multiplexes four event sources on one task:
//!
//! - **Frame interval** -- advances the animation loop with the real time
//!   elapsed since the previous frame (clamped by the clock).
//! - **State interval** -- field controller plus signal state tick.
//! - **Mint interval** -- warrant minting rules.
//! - **Command channel** -- host commands, queued until their boundary.
//!
//! After every frame and tick a fresh [`SimulationSnapshot`] replaces the
//! previous one on the watch channel. The loop ends on the optional run
//! duration or when the shutdown future resolves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::command::Command;
use crate::simulation::Simulation;
use crate::snapshot::SimulationSnapshot;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Every command sender was dropped.
    #[error("command channel closed")]
    CommandsClosed,

    /// Every snapshot receiver was dropped.
    #[error("snapshot channel closed")]
    SnapshotsClosed,
}

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// The configured run duration elapsed.
    Deadline,
    /// The shutdown future resolved.
    Shutdown,
}

/// Totals for a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Animation frames executed.
    pub frames: u64,
    /// Signal state ticks executed.
    pub state_ticks: u64,
    /// Minting ticks executed.
    pub mint_ticks: u64,
    /// Warrants minted across all minting ticks.
    pub warrants_minted: u64,
    /// Simulated seconds at the end of the run.
    pub sim_time: f64,
}

/// Drive `sim` until `run_for` elapses or `shutdown` resolves.
///
/// Cadences come from the simulation's timing configuration. Commands
/// received on `commands` are submitted immediately and applied at their
/// tick boundary.
///
/// # Errors
///
/// Returns [`RunnerError::CommandsClosed`] if every command sender is
/// dropped, or [`RunnerError::SnapshotsClosed`] if every snapshot receiver
/// is dropped.
pub async fn run_simulation<F>(
    sim: &mut Simulation,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    snapshots: &watch::Sender<Arc<SimulationSnapshot>>,
    run_for: Option<Duration>,
    shutdown: F,
) -> Result<RunSummary, RunnerError>
where
    F: Future<Output = ()>,
{
    let timing = sim.config().timing.clone();
    let mut frame = tokio::time::interval(Duration::from_millis(timing.frame_interval_ms.max(1)));
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut state = tokio::time::interval(Duration::from_millis(timing.state_tick_ms.max(1)));
    state.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut mint = tokio::time::interval(Duration::from_millis(timing.mint_tick_ms.max(1)));
    mint.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = async {
        match run_for {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    tokio::pin!(shutdown);

    info!(
        mode = %sim.mode(),
        frame_interval_ms = timing.frame_interval_ms,
        state_tick_ms = timing.state_tick_ms,
        mint_tick_ms = timing.mint_tick_ms,
        run_secs = run_for.map(|d| d.as_secs()),
        "Simulation starting"
    );

    let mut frames: u64 = 0;
    let mut state_ticks: u64 = 0;
    let mut mint_ticks: u64 = 0;
    let mut warrants_minted: u64 = 0;
    let mut last_frame = Instant::now();

    let end_reason = loop {
        tokio::select! {
            biased;

            () = &mut shutdown => break RunEndReason::Shutdown,

            () = &mut deadline => break RunEndReason::Deadline,

            command = commands.recv() => match command {
                Some(command) => {
                    debug!(command = ?command, "Command received");
                    sim.submit(command);
                }
                None => return Err(RunnerError::CommandsClosed),
            },

            _ = frame.tick() => {
                let now = Instant::now();
                let raw_dt = now.duration_since(last_frame).as_secs_f64();
                last_frame = now;
                sim.frame(raw_dt);
                frames = frames.saturating_add(1);
                publish(sim, snapshots)?;
            }

            _ = state.tick() => {
                sim.state_tick();
                state_ticks = state_ticks.saturating_add(1);
                publish(sim, snapshots)?;
            }

            _ = mint.tick() => {
                let report = sim.mint_tick();
                mint_ticks = mint_ticks.saturating_add(1);
                warrants_minted = warrants_minted
                    .saturating_add(u64::try_from(report.minted.len()).unwrap_or(u64::MAX));
                publish(sim, snapshots)?;
            }
        }
    };

    publish(sim, snapshots)?;
    Ok(RunSummary {
        end_reason,
        frames,
        state_ticks,
        mint_ticks,
        warrants_minted,
        sim_time: sim.now(),
    })
}

/// Replace the published snapshot.
fn publish(
    sim: &Simulation,
    snapshots: &watch::Sender<Arc<SimulationSnapshot>>,
) -> Result<(), RunnerError> {
    if snapshots.send(Arc::new(sim.snapshot())).is_err() {
        return Err(RunnerError::SnapshotsClosed);
    }
    Ok(())
}

/// Log the end of a run.
pub fn log_simulation_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        frames = summary.frames,
        state_ticks = summary.state_ticks,
        mint_ticks = summary.mint_ticks,
        warrants_minted = summary.warrants_minted,
        sim_time = summary.sim_time,
        "Simulation ended"
    );
}
