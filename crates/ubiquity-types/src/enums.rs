//! Enumeration types for the Ubiquity simulation.
//!
//! Physical enums (mode, obstacle kind, node role) describe the world the
//! wavefronts travel through. Semantic enums (signal kind, band, escalation,
//! warrant status, minting condition) describe the governance layer. The
//! barometer enums describe the discretized global risk level.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Physical layer
// ---------------------------------------------------------------------------

/// The active communication medium.
///
/// Selects the physics profile (velocity, absorption, echo capability) and
/// the fixed band assigned to every signal emitted while the mode is active.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Mode {
    /// Pressure waves: slow, muffled by walls, echoes off walls.
    #[default]
    Acoustic,
    /// Photon shells: fast, focused by lenses, reflected by mirrors.
    Light,
    /// Spacetime ripples: near-lossless, slowed near masses.
    Gravity,
}

impl Mode {
    /// All modes in declaration order.
    pub const ALL: [Self; 3] = [Self::Acoustic, Self::Light, Self::Gravity];

    /// The band every signal emitted in this mode is assigned.
    pub const fn band(self) -> Band {
        match self {
            Self::Acoustic | Self::Gravity => Band::Primitive,
            Self::Light => Band::Cognitive,
        }
    }

    /// Lowercase name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acoustic => "acoustic",
            Self::Light => "light",
            Self::Gravity => "gravity",
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of world obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ObjectKind {
    /// Occludes and attenuates acoustic fronts; source of echoes.
    Wall,
    /// Focuses light fronts into a secondary front at its center.
    Lens,
    /// Specularly reflects light fronts into a directional beam.
    Mirror,
    /// Dilates time near it, slowing gravity fronts.
    Mass,
}

/// Role of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum NodeRole {
    /// The single broadcasting node.
    Orchestrator,
    /// A receiving node.
    Agent,
}

/// Display tier derived from an agent's latest SNR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum StrengthTier {
    /// SNR at or below 0.25.
    Weak,
    /// SNR above 0.25 and at or below 0.6.
    Medium,
    /// SNR above 0.6.
    Strong,
}

impl StrengthTier {
    /// Classify an SNR value.
    pub const fn from_snr(snr: f64) -> Self {
        if snr > 0.6 {
            Self::Strong
        } else if snr > 0.25 {
            Self::Medium
        } else {
            Self::Weak
        }
    }
}

// ---------------------------------------------------------------------------
// Semantic layer
// ---------------------------------------------------------------------------

/// What a signal is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum SignalKind {
    /// A location or presence marker.
    Beacon,
    /// Something learned.
    Lesson,
    /// Something worth pursuing.
    Opportunity,
    /// A siren: escalates faster than the other kinds.
    Tension,
}

impl SignalKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 4] = [Self::Beacon, Self::Lesson, Self::Opportunity, Self::Tension];
}

/// Attenuation class applied uniformly to a signal's growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Band {
    /// 0 dB.
    Primitive,
    /// -6 dB.
    Cognitive,
    /// -12 dB.
    Social,
    /// Muted.
    Prestige,
}

impl Band {
    /// All bands in declaration order.
    pub const ALL: [Self; 4] = [Self::Primitive, Self::Cognitive, Self::Social, Self::Prestige];

    /// Multiplier applied to a signal's growth on every state tick.
    pub const fn attenuation(self) -> f64 {
        match self {
            Self::Primitive => 1.0,
            Self::Cognitive => 0.5,
            Self::Social => 0.25,
            Self::Prestige => 0.0,
        }
    }
}

/// Escalation state of a signal.
///
/// The engine only ever assigns `Active` and `Expired`; `Acknowledged` and
/// `Dismissed` belong to warrants and are kept here for wire compatibility
/// with hosts that share the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Escalation {
    /// Accruing volume.
    Active,
    /// Seen by an operator.
    Acknowledged,
    /// Waved off by an operator.
    Dismissed,
    /// Aged past its TTL; volume forced to zero.
    Expired,
}

/// Status of a minted warrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum WarrantStatus {
    /// Freshly minted; amplifies its source signals.
    Active,
    /// Seen by an operator; still subject to TTL removal.
    Acknowledged,
    /// Waved off; removed at the next state tick.
    Dismissed,
    /// Aged out.
    Expired,
}

impl WarrantStatus {
    /// Whether a warrant with this status is still held by the engine.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Active | Self::Acknowledged)
    }
}

/// The rule that minted a warrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MintingCondition {
    /// A single active signal grew past the volume threshold.
    VolumeThreshold,
    /// Beacon, lesson and tension signals co-occurred within the window.
    HarmonicTriad,
    /// Global breach risk crossed the circuit-breaker threshold.
    CircuitBreaker,
}

// ---------------------------------------------------------------------------
// Barometer
// ---------------------------------------------------------------------------

/// Discretized global obstruction level, 0 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BarometerPhase {
    /// Phase 0.
    Stable,
    /// Phase 1.
    Ripple,
    /// Phase 2.
    Surge,
    /// Phase 3.
    Breach,
    /// Phase 4.
    Cascade,
}

impl BarometerPhase {
    /// All phases in ascending order.
    pub const ALL: [Self; 5] = [
        Self::Stable,
        Self::Ripple,
        Self::Surge,
        Self::Breach,
        Self::Cascade,
    ];

    /// Numeric phase, 0 through 4.
    pub const fn index(self) -> u8 {
        match self {
            Self::Stable => 0,
            Self::Ripple => 1,
            Self::Surge => 2,
            Self::Breach => 3,
            Self::Cascade => 4,
        }
    }

    /// Phase for a numeric index; values above 4 saturate to `Cascade`.
    pub const fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Stable,
            1 => Self::Ripple,
            2 => Self::Surge,
            3 => Self::Breach,
            _ => Self::Cascade,
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stable => "Stable",
            Self::Ripple => "Ripple",
            Self::Surge => "Surge",
            Self::Breach => "Breach",
            Self::Cascade => "Cascade",
        }
    }
}

/// Operational tier unlocked at each barometer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PhaseTier {
    /// Phase 0.
    SimOnly,
    /// Phase 1.
    PaperTrading,
    /// Phase 2.
    ShadowLive,
    /// Phase 3.
    LiveRestricted,
    /// Phase 4.
    LiveFull,
}
