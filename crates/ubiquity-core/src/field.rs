//! The field controller: global scalar metrics and the advisory views
//! derived from them.
//!
//! Each [`FieldController::tick`] recomputes latency, breach risk,
//! congestion, the barometer phase and the phase-indexed demurrage rate
//! from the current mode and obstacle count. Everything else in this module
//! (phase tier, breach flags, task scoring, the economic bridge) is a pure
//! function of the latest metrics and never feeds back into the simulation.

use rand::Rng;
use tracing::debug;
use ubiquity_types::{
    BarometerPhase, BreachFlags, EconomicBridge, FieldMetrics, Mode, Node, PhaseTier, Warrant,
    WarrantStatus,
};

use crate::config::FieldConfig;

/// Demurrage rate per barometer phase, 0 through 4.
pub const DEMURRAGE_BY_PHASE: [f64; 5] = [0.0001, 0.00015, 0.0002, 0.00025, 0.0003];

/// Capability requirements for each routable task, in round-robin order.
pub const TASK_REQUIREMENTS: [(&str, &[&str]); 5] = [
    ("Data Processing", &["compute", "storage"]),
    ("Network Sync", &["network", "compute"]),
    ("Security Check", &["security", "compute"]),
    ("Load Balance", &["network", "analytics"]),
    ("Cache Update", &["storage", "network"]),
];

/// Requirement assumed for a task missing from [`TASK_REQUIREMENTS`].
const FALLBACK_REQUIREMENTS: &[&str] = &["compute"];

/// Obstacle factor ceiling.
const MAX_OBSTACLE_FACTOR: f64 = 0.3;

/// Obstacle factor contributed by each object.
const FACTOR_PER_OBJECT: f64 = 0.02;

/// Multiplier turning the obstacle factor into a phase.
const PHASE_SCALE: f64 = 14.0;

/// Fixed prior added to every score.
const EXEMPLAR_PRIOR: f64 = 0.2 * 0.6;

/// Locked stake at or above which disbursement is unsafe.
const SAFE_LOCKED_STAKE: f64 = 5.0;

/// Result of a soft prerequisite check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftPrereq {
    /// Fraction of the task's requirements the agent satisfies.
    pub value: f64,
    /// Score penalty for the unsatisfied remainder.
    pub penalty: f64,
}

/// Derives global field metrics and the views that hang off them.
#[derive(Debug, Clone)]
pub struct FieldController {
    metrics: FieldMetrics,
    penalty_max: f64,
    soft_block_decay_ms: u64,
    task_cursor: usize,
}

impl FieldController {
    /// Create a controller with calm initial metrics.
    pub const fn new(config: &FieldConfig) -> Self {
        Self {
            metrics: FieldMetrics {
                latency: 0.12,
                breach_risk: 0.06,
                congestion: 0.08,
                phase: BarometerPhase::Stable,
                demurrage_rate: DEMURRAGE_BY_PHASE[0],
                timestamp: 0.0,
            },
            penalty_max: config.penalty_max,
            soft_block_decay_ms: config.soft_block_decay_ms,
            task_cursor: 0,
        }
    }

    /// The latest metrics.
    pub const fn metrics(&self) -> FieldMetrics {
        self.metrics
    }

    /// Soft-block decay horizon reported to the host.
    pub const fn soft_block_decay_ms(&self) -> u64 {
        self.soft_block_decay_ms
    }

    /// Recompute the metrics for `mode` with `object_count` obstacles.
    pub fn tick(
        &mut self,
        mode: Mode,
        object_count: usize,
        now: f64,
        rng: &mut impl Rng,
    ) -> FieldMetrics {
        let factor = obstacle_factor(object_count);
        let phase = phase_for(factor);
        let base = match mode {
            Mode::Acoustic => 0.14,
            Mode::Light => 0.12,
            Mode::Gravity => 0.10,
        };
        let previous = self.metrics.phase;

        self.metrics = FieldMetrics {
            latency: round2(base + factor),
            breach_risk: round2(0.05 + factor),
            congestion: round2(0.06 + rng.random_range(0.0..0.02)),
            phase,
            demurrage_rate: demurrage_rate(phase),
            timestamp: now,
        };

        if phase != previous {
            debug!(
                from = previous.label(),
                to = phase.label(),
                breach_risk = self.metrics.breach_risk,
                "Barometer phase changed"
            );
        }
        self.metrics
    }

    /// Operational tier for the current phase.
    pub const fn phase_tier(&self) -> PhaseTier {
        phase_tier(self.metrics.phase)
    }

    /// Breach flags for the current phase.
    pub const fn breach_flags(&self) -> BreachFlags {
        breach_flags(self.metrics.phase)
    }

    /// How well `capabilities` cover the requirements of `task`.
    ///
    /// Unknown tasks require `compute`.
    pub fn soft_prereq(&self, task: &str, capabilities: &[String]) -> SoftPrereq {
        let needed = requirements(task);
        let have = needed
            .iter()
            .filter(|req| capabilities.iter().any(|c| c == *req))
            .count();
        let value = ratio(have, needed.len());
        SoftPrereq {
            value,
            penalty: (1.0 - value) * self.penalty_max,
        }
    }

    /// Advisory suitability of `agent` for `task` at the given SNR.
    ///
    /// Rewards capability fit and reception, subtracts field risk,
    /// congestion and agent load, and applies the soft-block penalty.
    pub fn score(&self, agent: &Node, task: &str, snr: f64) -> f64 {
        let fit = self.soft_prereq(task, &agent.capabilities);
        let blockers = 0.3 * self.metrics.breach_risk
            + 0.2 * self.metrics.congestion
            + 0.2 * agent.load;
        1.2 * fit.value + EXEMPLAR_PRIOR + 0.8 * snr.clamp(0.0, 1.0) - blockers - fit.penalty
    }

    /// The next task in round-robin order.
    pub fn next_task(&mut self) -> &'static str {
        let name = TASK_REQUIREMENTS
            .get(self.task_cursor.checked_rem(TASK_REQUIREMENTS.len()).unwrap_or(0))
            .map_or("Data Processing", |(name, _)| *name);
        self.task_cursor = self.task_cursor.wrapping_add(1);
        name
    }

    /// Stake accounting over `warrants` at the current phase.
    pub fn economic_bridge(&self, warrants: &[Warrant]) -> EconomicBridge {
        economic_bridge(warrants, self.metrics)
    }
}

/// Stake accounting over `warrants` under `metrics`.
///
/// Only active warrants lock stake.
pub fn economic_bridge(warrants: &[Warrant], metrics: FieldMetrics) -> EconomicBridge {
    let locked_stake: f64 = warrants
        .iter()
        .filter(|w| w.status == WarrantStatus::Active)
        .map(|w| w.stake_bond)
        .sum();
    EconomicBridge {
        locked_stake,
        penalty_accrued: locked_stake * metrics.demurrage_rate * 1000.0,
        disbursement_safe: metrics.phase < BarometerPhase::Breach
            && locked_stake < SAFE_LOCKED_STAKE,
        demurrage_tier: metrics.phase,
    }
}

/// Operational tier unlocked at `phase`.
pub const fn phase_tier(phase: BarometerPhase) -> PhaseTier {
    match phase {
        BarometerPhase::Stable => PhaseTier::SimOnly,
        BarometerPhase::Ripple => PhaseTier::PaperTrading,
        BarometerPhase::Surge => PhaseTier::ShadowLive,
        BarometerPhase::Breach => PhaseTier::LiveRestricted,
        BarometerPhase::Cascade => PhaseTier::LiveFull,
    }
}

/// Flags raised at `phase`; each flag implies every lower one.
pub const fn breach_flags(phase: BarometerPhase) -> BreachFlags {
    let level = phase.index();
    BreachFlags {
        rate_band_breach: level >= 1,
        reserve_breach: level >= 2,
        mint_halted: level >= 3,
        frozen: level >= 4,
    }
}

/// Demurrage rate for `phase`.
pub fn demurrage_rate(phase: BarometerPhase) -> f64 {
    DEMURRAGE_BY_PHASE
        .get(usize::from(phase.index()))
        .copied()
        .unwrap_or(DEMURRAGE_BY_PHASE[4])
}

fn obstacle_factor(object_count: usize) -> f64 {
    // Counts past the cap contribute nothing, so saturating is exact.
    let counted = u32::try_from(object_count).unwrap_or(u32::MAX).min(100);
    (f64::from(counted) * FACTOR_PER_OBJECT).min(MAX_OBSTACLE_FACTOR)
}

/// `floor(factor * 14)` clamped to `[0, 4]`.
fn phase_for(factor: f64) -> BarometerPhase {
    let scaled = factor * PHASE_SCALE;
    let level = [1.0, 2.0, 3.0, 4.0]
        .iter()
        .filter(|threshold| scaled >= **threshold)
        .count();
    BarometerPhase::from_index(u8::try_from(level).unwrap_or(4))
}

fn requirements(task: &str) -> &'static [&'static str] {
    TASK_REQUIREMENTS
        .iter()
        .find(|(name, _)| *name == task)
        .map_or(FALLBACK_REQUIREMENTS, |(_, needed)| *needed)
}

fn ratio(have: usize, needed: usize) -> f64 {
    let have = u32::try_from(have).unwrap_or(u32::MAX);
    let needed = u32::try_from(needed).unwrap_or(u32::MAX).max(1);
    f64::from(have) / f64::from(needed)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ubiquity_types::{Band, MintingCondition, NodeId, NodeRole, Point, StrengthTier, WarrantId};

    use super::*;

    fn controller() -> FieldController {
        FieldController::new(&FieldConfig::default())
    }

    fn agent(capabilities: &[&str], load: f64) -> Node {
        Node {
            id: NodeId::new("agent-0"),
            role: NodeRole::Agent,
            position: Point::new(0.0, 0.0),
            capabilities: capabilities.iter().map(|c| (*c).to_owned()).collect(),
            load,
            last_snr: 0.0,
            strength: StrengthTier::Weak,
            actor_group: None,
        }
    }

    fn warrant(id: u64, priority: f64, status: WarrantStatus) -> Warrant {
        Warrant {
            id: WarrantId(id),
            source_signal_ids: Vec::new(),
            minting_condition: MintingCondition::CircuitBreaker,
            band: Band::Primitive,
            priority,
            scope: Mode::Acoustic,
            status,
            stake_bond: 0.1 + priority * 0.4,
            created_at: 0.0,
        }
    }

    #[test]
    fn empty_world_is_stable() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = controller();
        let m = field.tick(Mode::Acoustic, 0, 0.0, &mut rng);
        assert_eq!(m.phase, BarometerPhase::Stable);
        assert!((m.demurrage_rate - 0.0001).abs() < 1e-12);
        assert!((m.latency - 0.14).abs() < 1e-12);
        assert!((m.breach_risk - 0.05).abs() < 1e-12);
        assert!((0.06..=0.08).contains(&m.congestion));
    }

    #[test]
    fn fifteen_objects_cap_at_cascade() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = controller();
        let m = field.tick(Mode::Gravity, 15, 1.0, &mut rng);
        assert_eq!(m.phase, BarometerPhase::Cascade);
        assert!((m.demurrage_rate - 0.0003).abs() < 1e-12);
        assert!((m.breach_risk - 0.35).abs() < 1e-12);
        assert!((m.latency - 0.4).abs() < 1e-12);
        assert!(field.breach_flags().frozen);
        assert_eq!(field.phase_tier(), PhaseTier::LiveFull);
    }

    #[test]
    fn phase_ladder_is_monotonic() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = controller();
        let mut last = BarometerPhase::Stable;
        for count in 0..20 {
            let phase = field.tick(Mode::Light, count, 0.0, &mut rng).phase;
            assert!(phase >= last);
            last = phase;
        }
        // 3 objects: factor 0.06, 0.84 -> phase 0. 4 objects: 1.12 -> phase 1.
        assert_eq!(field.tick(Mode::Light, 3, 0.0, &mut rng).phase, BarometerPhase::Stable);
        assert_eq!(field.tick(Mode::Light, 4, 0.0, &mut rng).phase, BarometerPhase::Ripple);
    }

    #[test]
    fn breach_flags_nest() {
        for phase in BarometerPhase::ALL {
            let f = breach_flags(phase);
            assert!(!f.frozen || f.mint_halted);
            assert!(!f.mint_halted || f.reserve_breach);
            assert!(!f.reserve_breach || f.rate_band_breach);
        }
        assert_eq!(breach_flags(BarometerPhase::Stable), BreachFlags::default());
    }

    #[test]
    fn soft_prereq_counts_satisfied_requirements() {
        let field = controller();
        let caps = vec!["compute".to_owned()];
        let half = field.soft_prereq("Data Processing", &caps);
        assert!((half.value - 0.5).abs() < 1e-12);
        assert!((half.penalty - 0.35).abs() < 1e-12);

        let unknown = field.soft_prereq("Defragment", &caps);
        assert!((unknown.value - 1.0).abs() < 1e-12);
        assert!(unknown.penalty.abs() < 1e-12);
    }

    #[test]
    fn score_rewards_fit_and_snr() {
        let field = controller();
        let fit = agent(&["network", "compute"], 0.2);
        let misfit = agent(&["ghost_chorus"], 0.2);
        assert!(field.score(&fit, "Network Sync", 0.5) > field.score(&misfit, "Network Sync", 0.5));
        assert!(field.score(&fit, "Network Sync", 0.9) > field.score(&fit, "Network Sync", 0.1));

        // 1.2 + 0.12 + 0.4 - (0.3*0.06 + 0.2*0.08 + 0.2*0.2)
        let expected = 1.2 + 0.12 + 0.4 - (0.018 + 0.016 + 0.04);
        assert!((field.score(&fit, "Network Sync", 0.5) - expected).abs() < 1e-9);
    }

    #[test]
    fn tasks_rotate() {
        let mut field = controller();
        let names: Vec<&str> = (0..6).map(|_| field.next_task()).collect();
        assert_eq!(names.first(), Some(&"Data Processing"));
        assert_eq!(names.get(4), Some(&"Cache Update"));
        assert_eq!(names.get(5), Some(&"Data Processing"));
    }

    #[test]
    fn bridge_locks_only_active_stake() {
        let field = controller();
        let warrants = vec![
            warrant(0, 1.0, WarrantStatus::Active),
            warrant(1, 0.5, WarrantStatus::Acknowledged),
            warrant(2, 0.0, WarrantStatus::Active),
        ];
        let bridge = field.economic_bridge(&warrants);
        assert!((bridge.locked_stake - 0.6).abs() < 1e-12);
        assert!((bridge.penalty_accrued - 0.6 * 0.0001 * 1000.0).abs() < 1e-12);
        assert!(bridge.disbursement_safe);
        assert_eq!(bridge.demurrage_tier, BarometerPhase::Stable);
    }

    #[test]
    fn bridge_unsafe_at_breach_phase() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = controller();
        field.tick(Mode::Acoustic, 11, 0.0, &mut rng);
        assert_eq!(field.metrics().phase, BarometerPhase::Breach);
        assert!(!field.economic_bridge(&[]).disbursement_safe);
    }
}
