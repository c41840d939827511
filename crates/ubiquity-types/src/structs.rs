//! Core entity structs for the Ubiquity simulation.
//!
//! World-level entities (nodes, obstacles, wavefronts, per-agent reception
//! state) are produced and consumed by the physics layer. Governance
//! entities (signals, warrants, triads) are owned by the signal engine.
//! Field metrics and the derived views (breach flags, economic bridge,
//! census, warrant lifecycle) carry no independent state and are always
//! recomputed from the latest snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    Band, BarometerPhase, Escalation, MintingCondition, Mode, NodeRole, ObjectKind, SignalKind,
    StrengthTier, WarrantStatus,
};
use crate::ids::{NodeId, ObjectId, SignalId, WarrantId, WavefrontId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A position in world pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Construct a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in pixels.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Translate by `(dx, dy)`.
    pub const fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A scene node: the orchestrator or one of the receiving agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Node {
    /// Host-chosen identifier.
    pub id: NodeId,
    /// Orchestrator or agent.
    pub role: NodeRole,
    /// Position in world pixels.
    pub position: Point,
    /// Capabilities the node can satisfy when scored against a task.
    pub capabilities: Vec<String>,
    /// Current load in `[0, 1]`.
    pub load: f64,
    /// Most recent instantaneous SNR written back by reception.
    pub last_snr: f64,
    /// Tier derived from `last_snr`.
    pub strength: StrengthTier,
    /// Cluster this agent was seeded into, if any.
    pub actor_group: Option<String>,
}

/// A world obstacle: an axis-aligned rectangle with a kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldObject {
    /// Host-chosen identifier.
    pub id: ObjectId,
    /// Wall, lens, mirror or mass.
    pub kind: ObjectKind,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Extent along x. Zero is tolerated.
    pub width: f64,
    /// Extent along y. Zero is tolerated.
    pub height: f64,
    /// Mirror surface angle in radians. When absent the surface runs along
    /// the longer side of the rectangle.
    #[serde(default)]
    pub surface_angle: Option<f64>,
}

impl WorldObject {
    /// Construct an obstacle with no explicit surface angle.
    pub fn new(
        id: impl Into<String>,
        kind: ObjectKind,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            id: ObjectId::new(id),
            kind,
            x,
            y,
            width,
            height,
            surface_angle: None,
        }
    }

    /// Center of the rectangle.
    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A propagating (expanding) or translating (beam) front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Wavefront {
    /// Sequence-assigned identifier.
    pub id: WavefrontId,
    /// Center of expansion; for beams, the current head position.
    pub source: Point,
    /// Current radius in pixels. Never decreases.
    pub radius: f64,
    /// Remaining energy in `[0, 1]`. Never increases.
    pub energy: f64,
    /// Nominal propagation speed in pixels per second.
    pub velocity: f64,
    /// Medium the front travels through.
    pub mode: Mode,
    /// Spawned as a wall echo.
    pub is_echo: bool,
    /// Directional beam spawned by a mirror.
    pub is_beam: bool,
    /// Beam heading in radians.
    pub angle: Option<f64>,
    /// The front this one was spawned from.
    pub parent: Option<WavefrontId>,
    /// Obstacles this front has already spawned a child from.
    #[ts(type = "Array<string>")]
    pub spawned_from: BTreeSet<ObjectId>,
    /// Simulation time of creation, in seconds.
    pub created_at: f64,
}

/// Per-agent reception snapshot, recomputed every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentSignalState {
    /// The receiving agent.
    pub agent_id: NodeId,
    /// Instantaneous signal-to-noise ratio in `[0, 1]`.
    pub snr: f64,
    /// Highest SNR observed since the last reset.
    pub peak_snr: f64,
    /// Simulation time a front last reached the agent.
    pub received_at: Option<f64>,
    /// Advisory gravitational phase delay accumulated this frame.
    pub phase_delay: f64,
}

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

/// A semantic event accruing volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Signal {
    /// Sequence-assigned identifier.
    pub id: SignalId,
    /// What the signal is about.
    pub kind: SignalKind,
    /// Attenuation class, fixed by the mode at emission.
    pub band: Band,
    /// Current volume in `[0, max_volume]`.
    pub volume: f64,
    /// Volume gained per second before attenuation.
    pub volume_rate: f64,
    /// Ceiling for `volume`.
    pub max_volume: f64,
    /// Active or expired.
    pub escalation: Escalation,
    /// The node that emitted the signal.
    pub source_actor: NodeId,
    /// Simulation time of emission, in seconds.
    pub created_at: f64,
}

/// A minted obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Warrant {
    /// Sequence-assigned identifier.
    pub id: WarrantId,
    /// Signals that triggered the mint. Empty for circuit breakers.
    pub source_signal_ids: Vec<SignalId>,
    /// The rule that minted the warrant.
    pub minting_condition: MintingCondition,
    /// Band the warrant was minted in.
    pub band: Band,
    /// Priority in `[0, 1]`.
    pub priority: f64,
    /// Mode active at mint time.
    pub scope: Mode,
    /// Lifecycle status.
    pub status: WarrantStatus,
    /// Stake locked by the warrant: `0.1 + priority * 0.4`.
    pub stake_bond: f64,
    /// Simulation time of minting, in seconds.
    pub created_at: f64,
}

/// Record of a beacon + lesson + tension co-occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HarmonicTriad {
    /// The beacon signal.
    pub beacon_id: SignalId,
    /// The lesson signal.
    pub lesson_id: SignalId,
    /// The tension signal.
    pub tension_id: SignalId,
    /// Simulation time of detection.
    pub detected_at: f64,
    /// The warrant minted for this triad.
    pub warrant_id: WarrantId,
}

impl HarmonicTriad {
    /// Whether this record covers exactly the given id triple.
    pub fn matches(&self, beacon: SignalId, lesson: SignalId, tension: SignalId) -> bool {
        self.beacon_id == beacon && self.lesson_id == lesson && self.tension_id == tension
    }
}

// ---------------------------------------------------------------------------
// Field metrics and derived views
// ---------------------------------------------------------------------------

/// Global scalar metrics derived by the field controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FieldMetrics {
    /// Propagation latency estimate.
    pub latency: f64,
    /// Probability-like breach risk.
    pub breach_risk: f64,
    /// Signal congestion with jitter.
    pub congestion: f64,
    /// Discretized obstruction level.
    pub phase: BarometerPhase,
    /// Proportional volume decay applied per state tick (scaled by 1000).
    pub demurrage_rate: f64,
    /// Simulation time of computation.
    pub timestamp: f64,
}

/// Safety flags raised as the barometer climbs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BreachFlags {
    /// Raised at phase 1 and above.
    pub rate_band_breach: bool,
    /// Raised at phase 2 and above.
    pub reserve_breach: bool,
    /// Raised at phase 3 and above.
    pub mint_halted: bool,
    /// Raised at phase 4.
    pub frozen: bool,
}

/// Stake accounting over the live warrant set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EconomicBridge {
    /// Sum of stake bonds over active warrants.
    pub locked_stake: f64,
    /// Per-cycle demurrage charge on the locked stake.
    pub penalty_accrued: f64,
    /// Whether disbursement is currently safe.
    pub disbursement_safe: bool,
    /// Barometer phase driving the demurrage tier.
    pub demurrage_tier: BarometerPhase,
}

/// The loudest live signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LoudestSignal {
    /// The signal.
    pub id: SignalId,
    /// Its kind.
    pub kind: SignalKind,
    /// Its volume.
    pub volume: f64,
}

/// Counts of live signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SignalCensus {
    /// Live signals per kind; every kind present, zero when absent.
    pub by_kind: BTreeMap<SignalKind, u32>,
    /// Live signals per band; every band present, zero when absent.
    pub by_band: BTreeMap<Band, u32>,
    /// The loudest live signal, if any.
    pub loudest: Option<LoudestSignal>,
}

/// Warrant lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WarrantLifecycle {
    /// Live warrants with status active.
    pub active: u32,
    /// Live warrants with status acknowledged.
    pub acknowledged: u32,
    /// Dismiss commands applied since the last reset.
    pub dismissed: u32,
    /// Non-dismissed removals since the last reset.
    pub expired: u32,
}
