//! Immutable read-only view of the whole simulation.
//!
//! A [`SimulationSnapshot`] carries every host query at one instant. The
//! runner publishes a fresh snapshot after each frame and tick, replacing
//! the previous one wholesale, so readers never observe a half-applied
//! update.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ubiquity_types::{
    AgentSignalState, BreachFlags, EconomicBridge, FieldMetrics, HarmonicTriad, Mode, Node, NodeId,
    PhaseTier, Signal, SignalCensus, Warrant, WarrantLifecycle, Wavefront, WorldObject,
};

/// Everything the host can query, captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Simulated seconds elapsed.
    pub sim_time: f64,
    /// Animation frames advanced.
    pub frames: u64,
    /// Active mode.
    pub mode: Mode,
    /// Current frame time scale.
    pub time_scale: f64,
    /// The time scale preset nearest the current scale.
    pub time_scale_preset: f64,
    /// Orchestrator and agents.
    pub nodes: Vec<Node>,
    /// World obstacles.
    pub objects: Vec<WorldObject>,
    /// Live wavefronts.
    pub wavefronts: Vec<Wavefront>,
    /// Reception state per agent.
    pub agent_signals: BTreeMap<NodeId, AgentSignalState>,
    /// Live signals.
    pub signals: Vec<Signal>,
    /// Live warrants.
    pub warrants: Vec<Warrant>,
    /// Detected harmonic triads.
    pub triads: Vec<HarmonicTriad>,
    /// Number of detected triads.
    pub triad_count: usize,
    /// Signal counts by kind and band.
    pub census: SignalCensus,
    /// Warrant lifecycle counters.
    pub warrant_lifecycle: WarrantLifecycle,
    /// Latest field metrics.
    pub field_metrics: FieldMetrics,
    /// Operational tier for the current phase.
    pub phase_tier: PhaseTier,
    /// Breach flags for the current phase.
    pub breach_flags: BreachFlags,
    /// Stake accounting over the live warrants.
    pub economic_bridge: EconomicBridge,
    /// Soft-block decay horizon for the host's scoring display.
    pub soft_block_decay_ms: u64,
}

impl SimulationSnapshot {
    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a value cannot be represented.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Mean instantaneous SNR across agents, or zero with no agents.
    pub fn mean_snr(&self) -> f64 {
        let count = u32::try_from(self.agent_signals.len()).unwrap_or(u32::MAX);
        if count == 0 {
            return 0.0;
        }
        self.agent_signals.values().map(|s| s.snr).sum::<f64>() / f64::from(count)
    }
}
