//! Field controller, wavefront propagation, reception, and the simulation
//! loop for Ubiquity.
//!
//! This crate wires the world model and the signal engine into a running
//! simulation. Host commands enter through [`Simulation::submit`] and are
//! applied at the next tick boundary of the engine that owns them; every
//! query is answered from the latest state or an immutable
//! [`SimulationSnapshot`].
//!
//! # Modules
//!
//! - [`clock`] -- Simulated time with a clamped, scaled frame step.
//! - [`command`] -- Host commands and their tick-boundary queues.
//! - [`config`] -- Configuration loading from `ubiquity-config.yaml` into
//!   strongly-typed structs.
//! - [`field`] -- [`FieldController`]: latency, risk, congestion, barometer
//!   phase, demurrage, task scoring, and the economic bridge.
//! - [`reception`] -- Per-agent SNR, peak and phase delay.
//! - [`runner`] -- Async driver publishing snapshots over a watch channel.
//! - [`simulation`] -- [`Simulation`], the host-facing façade.
//! - [`snapshot`] -- [`SimulationSnapshot`], every query at one instant.
//! - [`wavefront`] -- [`WavefrontEngine`]: expansion, decay, obstacle
//!   spawns, pruning.
//!
//! [`FieldController`]: field::FieldController
//! [`Simulation`]: simulation::Simulation
//! [`Simulation::submit`]: simulation::Simulation::submit
//! [`SimulationSnapshot`]: snapshot::SimulationSnapshot
//! [`WavefrontEngine`]: wavefront::WavefrontEngine

pub mod clock;
pub mod command;
pub mod config;
pub mod field;
pub mod reception;
pub mod runner;
pub mod simulation;
pub mod snapshot;
pub mod wavefront;

// Re-export primary types at crate root.
pub use clock::{ClockError, SimClock};
pub use command::Command;
pub use config::{ConfigError, SimulationConfig};
pub use field::FieldController;
pub use reception::SignalReception;
pub use runner::{RunEndReason, RunSummary, RunnerError, run_simulation};
pub use simulation::{FrameReport, Simulation};
pub use snapshot::SimulationSnapshot;
pub use wavefront::WavefrontEngine;
