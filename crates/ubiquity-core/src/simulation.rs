//! The simulation façade.
//!
//! [`Simulation`] owns the scene, the clock, and every engine, and exposes
//! the host surface: [`Simulation::submit`] for commands and read-only
//! queries for everything else. The three step functions are driven by
//! the runner on independent cadences:
//!
//! - [`Simulation::frame`] -- drains world commands, advances the clock,
//!   propagates wavefronts, and recomputes reception.
//! - [`Simulation::state_tick`] -- drains signal commands, ticks the field
//!   controller, then ticks the signal engine with the fresh demurrage rate.
//! - [`Simulation::mint_tick`] -- evaluates the minting rules against the
//!   latest breach risk.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};
use ubiquity_signals::{MintReport, SignalEngine, StateTickReport, census, warrant_lifecycle};
use ubiquity_types::{
    AgentSignalState, BreachFlags, EconomicBridge, FieldMetrics, HarmonicTriad, Mode, Node, NodeId,
    NodeRole, PhaseTier, Signal, SignalCensus, StrengthTier, Warrant, WarrantLifecycle, Wavefront,
    WorldObject,
};
use ubiquity_world::{ORCHESTRATOR_ID, Scene, random_object, seed_scene};

use crate::clock::{ClockError, SimClock};
use crate::command::{Command, CommandQueue};
use crate::config::SimulationConfig;
use crate::field::FieldController;
use crate::reception::SignalReception;
use crate::snapshot::SimulationSnapshot;
use crate::wavefront::{AdvanceReport, WavefrontEngine};

/// Outcome of one animation frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Simulated seconds applied this frame.
    pub dt: f64,
    /// Whether the raw step was clamped to the maximum.
    pub clamped: bool,
    /// Spawn and prune counts from propagation.
    pub propagation: AdvanceReport,
    /// Live fronts after the frame.
    pub fronts: usize,
}

/// The whole simulation: scene, clock, engines, and pending commands.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    mode: Mode,
    scene: Scene,
    clock: SimClock,
    field: FieldController,
    wavefronts: WavefrontEngine,
    reception: SignalReception,
    signals: SignalEngine,
    rng: StdRng,
    object_sequence: u64,
    pending: CommandQueue,
    last_state_tick: f64,
}

impl Simulation {
    /// Build a simulation and seed the scene for the configured mode.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the configured time scale or maximum frame
    /// step is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self, ClockError> {
        let mut rng = StdRng::seed_from_u64(config.world.seed);
        let scene = seed_scene(
            config.world.initial_mode,
            config.world.width,
            config.world.height,
            &mut rng,
        );
        Self::build(config, scene, rng)
    }

    /// Build a simulation over a host-supplied scene.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the configured time scale or maximum frame
    /// step is invalid.
    pub fn with_scene(config: SimulationConfig, scene: Scene) -> Result<Self, ClockError> {
        let rng = StdRng::seed_from_u64(config.world.seed);
        Self::build(config, scene, rng)
    }

    fn build(config: SimulationConfig, scene: Scene, rng: StdRng) -> Result<Self, ClockError> {
        let clock = SimClock::new(
            config.timing.time_scale,
            Duration::from_millis(config.timing.max_frame_step_ms),
        )?;
        let mode = config.world.initial_mode;

        info!(
            mode = %mode,
            seed = config.world.seed,
            nodes = scene.nodes.len(),
            objects = scene.objects.len(),
            "Simulation created"
        );

        Ok(Self {
            field: FieldController::new(&config.field),
            wavefronts: WavefrontEngine::new(config.world.width, config.world.height),
            reception: SignalReception::new(),
            signals: SignalEngine::new(config.signals.clone(), mode),
            config,
            mode,
            scene,
            clock,
            rng,
            object_sequence: 0,
            pending: CommandQueue::new(),
            last_state_tick: 0.0,
        })
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Queue a command for its tick boundary.
    pub fn submit(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Commands not yet applied.
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    fn apply_frame_command(&mut self, command: Command) {
        match command {
            Command::SetMode(mode) => self.set_mode(mode),
            Command::SetWorldObjects(objects) => {
                debug!(objects = objects.len(), "World objects replaced");
                self.scene.objects = objects;
            }
            Command::AddObject => {
                self.object_sequence = self.object_sequence.saturating_add(1);
                let object = random_object(self.mode, self.object_sequence, &mut self.rng);
                debug!(object = %object.id, x = object.x, y = object.y, "Object added");
                self.scene.objects.push(object);
            }
            Command::EmitWavefront(point) => {
                self.wavefronts.emit(point, self.mode, self.clock.now());
            }
            Command::Broadcast => {
                self.pending.push(Command::EmitSignal(None));
                let Some(position) = self.scene.orchestrator().map(|n| n.position) else {
                    debug!("Broadcast without an orchestrator emits no wavefront");
                    return;
                };
                self.wavefronts.emit(position, self.mode, self.clock.now());
            }
            Command::SetTimeScale(scale) => match self.clock.set_time_scale(scale) {
                Ok(()) => debug!(scale, "Time scale changed"),
                Err(e) => warn!(error = %e, "Time scale change rejected"),
            },
            Command::Reset => self.reset(),
            Command::InitializeScene => self.initialize_scene(),
            Command::EmitSignal(_)
            | Command::AcknowledgeWarrant(_)
            | Command::DismissWarrant(_) => self.apply_state_command(command),
        }
    }

    fn apply_state_command(&mut self, command: Command) {
        let now = self.clock.now();
        match command {
            Command::EmitSignal(kind) => {
                let source = self
                    .scene
                    .orchestrator()
                    .map_or_else(|| NodeId::new(ORCHESTRATOR_ID), |n| n.id.clone());
                self.signals.emit_signal(kind, source, now, &mut self.rng);
            }
            Command::AcknowledgeWarrant(id) => {
                self.signals.acknowledge_warrant(id);
            }
            Command::DismissWarrant(id) => {
                self.signals.dismiss_warrant(id);
            }
            other => self.apply_frame_command(other),
        }
    }

    /// Hard reset into `mode`: clear every engine, return to real time and
    /// seed a fresh scene.
    fn set_mode(&mut self, mode: Mode) {
        info!(from = %self.mode, to = %mode, "Mode changed, hard reset");
        self.mode = mode;
        self.reset();
        self.clock.reset_time_scale();
        self.object_sequence = 0;
        self.scene = seed_scene(
            mode,
            self.config.world.width,
            self.config.world.height,
            &mut self.rng,
        );
    }

    /// Clear wavefronts, reception, the signal engine and pending signal
    /// commands. The scene is kept. Idempotent.
    fn reset(&mut self) {
        self.wavefronts.clear();
        self.reception.clear();
        self.signals.reset(self.mode);
        self.pending.clear_state();
        for node in self
            .scene
            .nodes
            .iter_mut()
            .filter(|n| n.role == NodeRole::Agent)
        {
            node.last_snr = 0.0;
            node.strength = StrengthTier::Weak;
        }
        info!(mode = %self.mode, "Simulation reset");
    }

    fn initialize_scene(&mut self) {
        self.wavefronts.clear();
        self.reception.clear();
        self.object_sequence = 0;
        self.scene = seed_scene(
            self.mode,
            self.config.world.width,
            self.config.world.height,
            &mut self.rng,
        );
        info!(mode = %self.mode, nodes = self.scene.nodes.len(), "Scene initialized");
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    /// Advance one animation frame whose raw duration was `raw_dt` seconds.
    pub fn frame(&mut self, raw_dt: f64) -> FrameReport {
        for command in self.pending.drain_frame() {
            self.apply_frame_command(command);
        }

        let clamped = self.clock.would_clamp(raw_dt);
        if clamped {
            debug!(raw_dt, "Frame step clamped");
        }
        let dt = self.clock.advance_frame(raw_dt);
        let now = self.clock.now();

        let propagation = self.wavefronts.advance(dt, now, &self.scene.objects);
        self.reception.update(
            self.wavefronts.fronts(),
            &mut self.scene.nodes,
            &self.scene.objects,
            now,
        );

        FrameReport {
            dt,
            clamped,
            propagation,
            fronts: self.wavefronts.fronts().len(),
        }
    }

    /// Run one signal state tick: field controller first, then the signal
    /// engine over the simulated time since the previous state tick.
    pub fn state_tick(&mut self) -> StateTickReport {
        for command in self.pending.drain_state() {
            self.apply_state_command(command);
        }

        let now = self.clock.now();
        let dt = (now - self.last_state_tick).max(0.0);
        self.last_state_tick = now;

        let metrics = self
            .field
            .tick(self.mode, self.scene.objects.len(), now, &mut self.rng);
        self.signals.state_tick(now, dt, metrics.demurrage_rate)
    }

    /// Run one minting tick against the latest breach risk.
    pub fn mint_tick(&mut self) -> MintReport {
        let now = self.clock.now();
        self.signals
            .mint_tick(now, self.field.metrics().breach_risk)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Configuration the simulation was built from.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Active mode.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Simulated seconds elapsed.
    pub const fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Current frame time scale.
    pub const fn time_scale(&self) -> f64 {
        self.clock.time_scale()
    }

    /// Orchestrator and agents.
    pub fn nodes(&self) -> &[Node] {
        &self.scene.nodes
    }

    /// World obstacles.
    pub fn objects(&self) -> &[WorldObject] {
        &self.scene.objects
    }

    /// Live wavefronts.
    pub fn wavefronts(&self) -> &[Wavefront] {
        self.wavefronts.fronts()
    }

    /// Reception state per agent.
    pub const fn agent_signals(&self) -> &BTreeMap<NodeId, AgentSignalState> {
        self.reception.states()
    }

    /// Live signals.
    pub fn signals(&self) -> &[Signal] {
        self.signals.signals()
    }

    /// Live warrants.
    pub fn warrants(&self) -> &[Warrant] {
        self.signals.warrants()
    }

    /// Detected harmonic triads.
    pub fn triads(&self) -> &[HarmonicTriad] {
        self.signals.triads()
    }

    /// Number of detected triads.
    pub fn triad_count(&self) -> usize {
        self.signals.triad_count()
    }

    /// Signal counts by kind and band.
    pub fn census(&self) -> SignalCensus {
        census(self.signals.signals())
    }

    /// Warrant lifecycle counters.
    pub fn warrant_lifecycle(&self) -> WarrantLifecycle {
        warrant_lifecycle(self.signals.warrants(), self.signals.counters())
    }

    /// Latest field metrics.
    pub const fn field_metrics(&self) -> FieldMetrics {
        self.field.metrics()
    }

    /// Operational tier for the current phase.
    pub const fn phase_tier(&self) -> PhaseTier {
        self.field.phase_tier()
    }

    /// Breach flags for the current phase.
    pub const fn breach_flags(&self) -> BreachFlags {
        self.field.breach_flags()
    }

    /// Stake accounting over the live warrants.
    pub fn economic_bridge(&self) -> EconomicBridge {
        self.field.economic_bridge(self.signals.warrants())
    }

    /// Advisory score of an agent for `task` at its current SNR. `None` for
    /// an unknown agent.
    pub fn score_agent(&self, agent: &NodeId, task: &str) -> Option<f64> {
        let node = self.scene.nodes.iter().find(|n| &n.id == agent)?;
        let snr = self.reception.state(agent).map_or(0.0, |s| s.snr);
        Some(self.field.score(node, task, snr))
    }

    /// The next task in round-robin order.
    pub fn next_task(&mut self) -> &'static str {
        self.field.next_task()
    }

    /// Capture every query into an immutable snapshot.
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            sim_time: self.clock.now(),
            frames: self.clock.frames(),
            mode: self.mode,
            time_scale: self.clock.time_scale(),
            time_scale_preset: self.clock.nearest_preset(),
            nodes: self.scene.nodes.clone(),
            objects: self.scene.objects.clone(),
            wavefronts: self.wavefronts.fronts().to_vec(),
            agent_signals: self.reception.states().clone(),
            signals: self.signals.signals().to_vec(),
            warrants: self.signals.warrants().to_vec(),
            triads: self.signals.triads().to_vec(),
            triad_count: self.signals.triad_count(),
            census: self.census(),
            warrant_lifecycle: self.warrant_lifecycle(),
            field_metrics: self.field.metrics(),
            phase_tier: self.field.phase_tier(),
            breach_flags: self.field.breach_flags(),
            economic_bridge: self.economic_bridge(),
            soft_block_decay_ms: self.field.soft_block_decay_ms(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use ubiquity_types::{ObjectKind, Point, SignalKind};

    use super::*;

    fn sim() -> Simulation {
        Simulation::new(SimulationConfig::default()).unwrap()
    }

    #[test]
    fn new_seeds_the_initial_scene() {
        let s = sim();
        assert_eq!(s.mode(), Mode::Acoustic);
        assert_eq!(s.nodes().len(), 14);
        assert_eq!(s.objects().len(), 3);
        assert!(s.wavefronts().is_empty());
    }

    #[test]
    fn commands_wait_for_their_boundary() {
        let mut s = sim();
        s.submit(Command::EmitWavefront(Point::new(100.0, 100.0)));
        s.submit(Command::EmitSignal(Some(SignalKind::Beacon)));
        assert!(s.wavefronts().is_empty());
        assert!(s.signals().is_empty());

        s.frame(0.016);
        assert_eq!(s.wavefronts().len(), 1);
        assert!(s.signals().is_empty());

        s.state_tick();
        assert_eq!(s.signals().len(), 1);
        assert_eq!(s.pending_commands(), 0);
    }

    #[test]
    fn broadcast_emits_front_and_signal() {
        let mut s = sim();
        s.submit(Command::Broadcast);
        s.frame(0.016);
        let front = s.wavefronts().first().unwrap();
        assert!((front.source.x - 400.0).abs() < f64::EPSILON);
        assert!((front.source.y - 280.0).abs() < f64::EPSILON);
        s.state_tick();
        assert_eq!(s.signals().len(), 1);
        assert_eq!(s.signals().first().unwrap().source_actor.as_str(), ORCHESTRATOR_ID);
    }

    #[test]
    fn invalid_time_scale_is_ignored() {
        let mut s = sim();
        s.submit(Command::SetTimeScale(-1.0));
        s.frame(0.016);
        assert!((s.time_scale() - 1.0).abs() < f64::EPSILON);

        s.submit(Command::SetTimeScale(4.0));
        let report = s.frame(0.016);
        assert!((report.dt - 0.064).abs() < 1e-12);
    }

    #[test]
    fn stalled_frame_is_clamped() {
        let mut s = sim();
        let report = s.frame(1.0);
        assert!(report.clamped);
        assert!((report.dt - 0.05).abs() < 1e-12);
    }

    #[test]
    fn add_object_uses_mode_kind() {
        let mut s = sim();
        s.submit(Command::AddObject);
        s.submit(Command::AddObject);
        s.frame(0.016);
        assert_eq!(s.objects().len(), 5);
        assert!(s.objects().iter().all(|o| o.kind == ObjectKind::Wall));
        assert_eq!(s.objects().last().unwrap().id.as_str(), "gate-x2");
    }

    #[test]
    fn mode_change_is_a_hard_reset() {
        let mut s = sim();
        s.submit(Command::SetTimeScale(4.0));
        s.submit(Command::Broadcast);
        s.frame(0.016);
        s.state_tick();
        assert!(!s.signals().is_empty());

        s.submit(Command::SetMode(Mode::Light));
        s.frame(0.016);
        assert_eq!(s.mode(), Mode::Light);
        assert!(s.signals().is_empty());
        assert!(s.wavefronts().is_empty());
        assert!((s.time_scale() - 1.0).abs() < f64::EPSILON);
        assert!(s.objects().iter().all(|o| o.kind != ObjectKind::Wall));
        assert_eq!(s.warrant_lifecycle(), WarrantLifecycle::default());
    }

    #[test]
    fn unknown_agent_has_no_score() {
        let mut s = sim();
        assert!(s.score_agent(&NodeId::new("nobody"), "Network Sync").is_none());
        let task = s.next_task();
        assert!(s.score_agent(&NodeId::new("agent-0"), task).is_some());
    }

    #[test]
    fn snapshot_reports_preset_and_decay_horizon() {
        let mut config = SimulationConfig::default();
        config.field.soft_block_decay_ms = 1_200;
        let mut s = Simulation::new(config).unwrap();
        s.submit(Command::SetTimeScale(0.2));
        s.frame(0.016);

        let snapshot = s.snapshot();
        assert!((snapshot.time_scale - 0.2).abs() < f64::EPSILON);
        assert!((snapshot.time_scale_preset - 0.25).abs() < f64::EPSILON);
        assert_eq!(snapshot.soft_block_decay_ms, 1_200);
    }

    #[test]
    fn snapshot_serializes() {
        let mut s = sim();
        s.submit(Command::Broadcast);
        s.frame(0.016);
        s.state_tick();
        let json = s.snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "acoustic");
        assert!(value["agent_signals"]["agent-0"].is_object());
        assert_eq!(value["wavefronts"].as_array().unwrap().len(), 1);
    }
}
