//! The signal/warrant state machine.
//!
//! [`SignalEngine`] owns every live signal, warrant, and harmonic triad. It
//! is driven by two independent fixed-rate loops:
//!
//! - **State tick** (10 Hz) -- ages signals, accrues volume, applies band
//!   attenuation, warrant amplification and demurrage, and retires expired
//!   signals and warrants.
//! - **Minting tick** (2 Hz) -- evaluates the three minting rules
//!   (volume threshold, harmonic triad, circuit breaker).
//!
//! Operator commands (emit, acknowledge, dismiss) are applied by the caller
//! at a tick boundary; the engine itself never schedules anything.
//!
//! All times are simulated seconds supplied by the caller, so the engine is
//! fully deterministic given the same inputs and random source.

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};
use ubiquity_types::{
    Band, Escalation, HarmonicTriad, IdSequence, MintingCondition, Mode, NodeId, Signal,
    SignalId, SignalKind, Warrant, WarrantId, WarrantStatus,
};

use crate::config::SignalsConfig;

/// Signals at or below this volume are eligible for removal once expired.
const REMOVAL_VOLUME: f64 = 0.001;

/// Priority assigned to harmonic triad warrants.
const TRIAD_PRIORITY: f64 = 0.9;

/// Demurrage rates are expressed per millisecond-cycle.
const DEMURRAGE_SCALE: f64 = 1000.0;

/// Counters for warrants that have left the live set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleCounters {
    /// Dismiss commands that transitioned a warrant to dismissed.
    pub dismissed: u32,
    /// Warrants retired for any reason other than dismissal.
    pub expired: u32,
}

/// Outcome of one state tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateTickReport {
    /// Signals that crossed their TTL during this tick.
    pub signals_expired: u32,
    /// Signals removed from the live set.
    pub signals_removed: u32,
    /// Warrants removed from the live set (dismissed or aged out).
    pub warrants_removed: u32,
}

/// Outcome of one minting tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MintReport {
    /// Warrants minted during this tick, in minting order.
    pub minted: Vec<WarrantId>,
    /// The harmonic triad detected this tick, if any.
    pub triad: Option<HarmonicTriad>,
}

/// The signal/warrant state machine.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: SignalsConfig,
    mode: Mode,
    ids: IdSequence,
    signals: Vec<Signal>,
    warrants: Vec<Warrant>,
    triads: Vec<HarmonicTriad>,
    counters: LifecycleCounters,
}

impl SignalEngine {
    /// Create an empty engine for `mode`.
    pub const fn new(config: SignalsConfig, mode: Mode) -> Self {
        Self::with_sequence(config, mode, IdSequence::new())
    }

    /// Create an empty engine drawing ids from `ids`.
    pub const fn with_sequence(config: SignalsConfig, mode: Mode, ids: IdSequence) -> Self {
        Self {
            config,
            mode,
            ids,
            signals: Vec::new(),
            warrants: Vec::new(),
            triads: Vec::new(),
            counters: LifecycleCounters {
                dismissed: 0,
                expired: 0,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The mode whose band new signals are assigned.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The engine configuration.
    pub const fn config(&self) -> &SignalsConfig {
        &self.config
    }

    /// Live signals in emission order.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Live warrants in minting order.
    pub fn warrants(&self) -> &[Warrant] {
        &self.warrants
    }

    /// Every harmonic triad recorded since the last reset.
    pub fn triads(&self) -> &[HarmonicTriad] {
        &self.triads
    }

    /// Number of triads recorded since the last reset.
    pub fn triad_count(&self) -> usize {
        self.triads.len()
    }

    /// Dismissed and expired counters.
    pub const fn counters(&self) -> LifecycleCounters {
        self.counters
    }

    /// Look up a live signal.
    pub fn signal(&self, id: SignalId) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == id)
    }

    /// Look up a live warrant.
    pub fn warrant(&self, id: WarrantId) -> Option<&Warrant> {
        self.warrants.iter().find(|w| w.id == id)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Emit a new signal from `source` at time `now`.
    ///
    /// When `kind` is `None` one is drawn uniformly. The band is fixed by
    /// the current mode. Tension signals escalate faster than the others.
    pub fn emit_signal(
        &mut self,
        kind: Option<SignalKind>,
        source: NodeId,
        now: f64,
        rng: &mut impl Rng,
    ) -> SignalId {
        let kind = kind.unwrap_or_else(|| {
            SignalKind::ALL
                .choose(rng)
                .copied()
                .unwrap_or(SignalKind::Beacon)
        });
        let volume_rate = if kind == SignalKind::Tension {
            0.04 + rng.random_range(0.0..0.04)
        } else {
            0.02 + rng.random_range(0.0..0.04)
        };
        let id = SignalId::next(&mut self.ids);
        let signal = Signal {
            id,
            kind,
            band: self.mode.band(),
            volume: 0.1 + rng.random_range(0.0..0.3),
            volume_rate,
            max_volume: 0.7 + rng.random_range(0.0..0.3),
            escalation: Escalation::Active,
            source_actor: source,
            created_at: now,
        };
        debug!(
            signal = %id,
            kind = ?kind,
            band = ?signal.band,
            volume = signal.volume,
            "Signal emitted"
        );
        self.signals.push(signal);
        id
    }

    /// Mark a warrant acknowledged.
    ///
    /// Only active warrants transition; acknowledged warrants remain subject
    /// to TTL retirement. Returns `false` for unknown or non-active ids.
    pub fn acknowledge_warrant(&mut self, id: WarrantId) -> bool {
        match self.warrants.iter_mut().find(|w| w.id == id) {
            Some(warrant) if warrant.status == WarrantStatus::Active => {
                warrant.status = WarrantStatus::Acknowledged;
                info!(warrant = %id, "Warrant acknowledged");
                true
            }
            Some(_) => false,
            None => {
                debug!(warrant = %id, "Acknowledge for unknown warrant ignored");
                false
            }
        }
    }

    /// Mark a warrant dismissed; it is removed at the next state tick.
    ///
    /// The dismissed counter increments once per warrant, however many times
    /// the command is repeated. Returns `false` for unknown or already
    /// dismissed ids.
    pub fn dismiss_warrant(&mut self, id: WarrantId) -> bool {
        match self.warrants.iter_mut().find(|w| w.id == id) {
            Some(warrant) if warrant.status != WarrantStatus::Dismissed => {
                warrant.status = WarrantStatus::Dismissed;
                self.counters.dismissed = self.counters.dismissed.saturating_add(1);
                info!(warrant = %id, "Warrant dismissed");
                true
            }
            Some(_) => false,
            None => {
                debug!(warrant = %id, "Dismiss for unknown warrant ignored");
                false
            }
        }
    }

    /// Hard reset: clear signals, warrants, triads and counters, and adopt
    /// `mode` for future emissions. The id sequence keeps counting so ids
    /// are never reused.
    pub fn reset(&mut self, mode: Mode) {
        self.mode = mode;
        self.signals.clear();
        self.warrants.clear();
        self.triads.clear();
        self.counters = LifecycleCounters::default();
    }

    // -----------------------------------------------------------------------
    // State tick
    // -----------------------------------------------------------------------

    /// Advance every signal and warrant by `dt` seconds ending at `now`.
    ///
    /// `demurrage_rate` is the field controller's current proportional
    /// decay rate.
    pub fn state_tick(&mut self, now: f64, dt: f64, demurrage_rate: f64) -> StateTickReport {
        let mut report = StateTickReport::default();
        let dt = dt.max(0.0);
        let amplification = self.config.warrant_amplification;
        let signal_ttl = self.config.signal_ttl_secs;
        let warrants = &self.warrants;

        for signal in &mut self.signals {
            if signal.escalation == Escalation::Expired {
                continue;
            }
            if now - signal.created_at > signal_ttl {
                signal.volume = 0.0;
                signal.escalation = Escalation::Expired;
                report.signals_expired = report.signals_expired.saturating_add(1);
                continue;
            }

            let boost: f64 = warrants
                .iter()
                .filter(|w| w.status == WarrantStatus::Active)
                .filter(|w| w.source_signal_ids.contains(&signal.id))
                .map(|w| w.priority * amplification)
                .sum();

            let mut volume = signal.volume + signal.volume_rate * dt * signal.band.attenuation();
            volume += boost * dt;
            volume = volume.min(signal.max_volume);
            volume -= demurrage_rate * volume * dt * DEMURRAGE_SCALE;
            signal.volume = volume.clamp(0.0, signal.max_volume);
        }

        let before = self.signals.len();
        self.signals
            .retain(|s| !(s.volume <= REMOVAL_VOLUME && s.escalation == Escalation::Expired));
        report.signals_removed = count_u32(before.saturating_sub(self.signals.len()));

        let warrant_ttl = self.config.warrant_ttl_secs;
        let mut expired: u32 = 0;
        let before = self.warrants.len();
        self.warrants.retain(|w| {
            if w.status == WarrantStatus::Dismissed {
                return false;
            }
            if now - w.created_at >= warrant_ttl {
                expired = expired.saturating_add(1);
                return false;
            }
            true
        });
        report.warrants_removed = count_u32(before.saturating_sub(self.warrants.len()));
        self.counters.expired = self.counters.expired.saturating_add(expired);

        report
    }

    // -----------------------------------------------------------------------
    // Minting tick
    // -----------------------------------------------------------------------

    /// Evaluate the minting rules at time `now` against the current global
    /// breach risk.
    pub fn mint_tick(&mut self, now: f64, breach_risk: f64) -> MintReport {
        let mut report = MintReport::default();

        // Volume threshold: one warrant per signal while a live one exists.
        let loud: Vec<(SignalId, Band, f64)> = self
            .signals
            .iter()
            .filter(|s| s.escalation == Escalation::Active)
            .filter(|s| s.volume > self.config.volume_threshold)
            .filter(|s| !self.has_live_threshold_warrant(s.id))
            .map(|s| (s.id, s.band, s.volume))
            .collect();
        for (signal_id, band, volume) in loud {
            let id = self.mint(
                vec![signal_id],
                MintingCondition::VolumeThreshold,
                band,
                volume,
                now,
            );
            report.minted.push(id);
        }

        // Harmonic triad.
        if let Some(triad) = self.detect_triad(now) {
            report.minted.push(triad.warrant_id);
            report.triad = Some(triad);
        }

        // Circuit breaker.
        let breaker_active = self.warrants.iter().any(|w| {
            w.minting_condition == MintingCondition::CircuitBreaker
                && w.status == WarrantStatus::Active
        });
        if breach_risk > self.config.circuit_breaker_risk && !breaker_active {
            let id = self.mint(
                Vec::new(),
                MintingCondition::CircuitBreaker,
                self.mode.band(),
                breach_risk,
                now,
            );
            report.minted.push(id);
        }

        report
    }

    fn has_live_threshold_warrant(&self, signal: SignalId) -> bool {
        self.warrants.iter().any(|w| {
            w.minting_condition == MintingCondition::VolumeThreshold
                && w.status.is_live()
                && w.source_signal_ids.contains(&signal)
        })
    }

    fn first_active(&self, kind: SignalKind) -> Option<&Signal> {
        self.signals
            .iter()
            .find(|s| s.kind == kind && s.escalation == Escalation::Active)
    }

    fn detect_triad(&mut self, now: f64) -> Option<HarmonicTriad> {
        let beacon = self.first_active(SignalKind::Beacon)?;
        let lesson = self.first_active(SignalKind::Lesson)?;
        let tension = self.first_active(SignalKind::Tension)?;

        let oldest = beacon
            .created_at
            .min(lesson.created_at)
            .min(tension.created_at);
        if now - oldest >= self.config.triad_window_secs {
            return None;
        }

        let (beacon_id, lesson_id, tension_id) = (beacon.id, lesson.id, tension.id);
        if self
            .triads
            .iter()
            .any(|t| t.matches(beacon_id, lesson_id, tension_id))
        {
            return None;
        }

        let warrant_id = self.mint(
            vec![beacon_id, lesson_id, tension_id],
            MintingCondition::HarmonicTriad,
            Band::Social,
            TRIAD_PRIORITY,
            now,
        );
        let triad = HarmonicTriad {
            beacon_id,
            lesson_id,
            tension_id,
            detected_at: now,
            warrant_id,
        };
        info!(
            beacon = %beacon_id,
            lesson = %lesson_id,
            tension = %tension_id,
            warrant = %warrant_id,
            "Harmonic triad detected"
        );
        self.triads.push(triad.clone());
        Some(triad)
    }

    fn mint(
        &mut self,
        source_signal_ids: Vec<SignalId>,
        condition: MintingCondition,
        band: Band,
        priority: f64,
        now: f64,
    ) -> WarrantId {
        let priority = priority.clamp(0.0, 1.0);
        let id = WarrantId::next(&mut self.ids);
        info!(
            warrant = %id,
            condition = ?condition,
            band = ?band,
            priority,
            "Warrant minted"
        );
        self.warrants.push(Warrant {
            id,
            source_signal_ids,
            minting_condition: condition,
            band,
            priority,
            scope: self.mode,
            status: WarrantStatus::Active,
            stake_bond: 0.1 + priority * 0.4,
            created_at: now,
        });
        id
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn engine() -> SignalEngine {
        SignalEngine::new(SignalsConfig::default(), Mode::Acoustic)
    }

    fn orchestrator() -> NodeId {
        NodeId::new("orchestrator")
    }

    #[test]
    fn emitted_signal_uses_mode_band_and_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut eng = SignalEngine::new(SignalsConfig::default(), Mode::Light);
        for _ in 0..50 {
            eng.emit_signal(None, orchestrator(), 0.0, &mut rng);
        }
        for s in eng.signals() {
            assert_eq!(s.band, Band::Cognitive);
            assert!((0.1..0.4).contains(&s.volume));
            assert!((0.7..1.0).contains(&s.max_volume));
            assert_eq!(s.escalation, Escalation::Active);
            if s.kind == SignalKind::Tension {
                assert!((0.04..0.08).contains(&s.volume_rate));
            } else {
                assert!((0.02..0.06).contains(&s.volume_rate));
            }
        }
    }

    #[test]
    fn volume_grows_and_stays_within_max() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut eng = engine();
        let id = eng.emit_signal(Some(SignalKind::Beacon), orchestrator(), 0.0, &mut rng);
        let start = eng.signal(id).unwrap().volume;

        let mut now = 0.0;
        for _ in 0..100 {
            now += 0.1;
            eng.state_tick(now, 0.1, 0.0);
        }
        let s = eng.signal(id).unwrap();
        assert!(s.volume > start);
        assert!(s.volume <= s.max_volume);
    }

    #[test]
    fn demurrage_pulls_volume_down() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut plain = engine();
        let mut taxed = engine();
        let a = plain.emit_signal(Some(SignalKind::Lesson), orchestrator(), 0.0, &mut rng.clone());
        let b = taxed.emit_signal(Some(SignalKind::Lesson), orchestrator(), 0.0, &mut rng);
        plain.state_tick(0.1, 0.1, 0.0);
        taxed.state_tick(0.1, 0.1, 0.0003);
        assert!(taxed.signal(b).unwrap().volume < plain.signal(a).unwrap().volume);
    }

    #[test]
    fn signal_expires_after_ttl_and_is_removed() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut eng = engine();
        eng.emit_signal(Some(SignalKind::Opportunity), orchestrator(), 0.0, &mut rng);
        let report = eng.state_tick(20.5, 0.1, 0.0001);
        assert_eq!(report.signals_expired, 1);
        assert_eq!(report.signals_removed, 1);
        assert!(eng.signals().is_empty());
    }

    #[test]
    fn volume_threshold_mints_once_per_signal() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut eng = engine();
        let id = eng.emit_signal(Some(SignalKind::Beacon), orchestrator(), 0.0, &mut rng);
        eng.signals.iter_mut().for_each(|s| {
            s.max_volume = 1.0;
            s.volume = 0.85;
        });

        let first = eng.mint_tick(0.5, 0.0);
        let second = eng.mint_tick(1.0, 0.0);
        assert_eq!(first.minted.len(), 1);
        assert!(second.minted.is_empty());

        let w = eng.warrant(first.minted[0]).unwrap();
        assert_eq!(w.minting_condition, MintingCondition::VolumeThreshold);
        assert_eq!(w.source_signal_ids, vec![id]);
        assert!((w.priority - 0.85).abs() < 1e-12);
        assert!((w.stake_bond - (0.1 + 0.85 * 0.4)).abs() < 1e-12);
    }

    #[test]
    fn quiet_signal_never_mints() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut eng = engine();
        eng.emit_signal(Some(SignalKind::Opportunity), orchestrator(), 0.0, &mut rng);
        eng.signals.iter_mut().for_each(|s| s.max_volume = 0.75);
        let mut now = 0.0;
        for _ in 0..40 {
            now += 0.1;
            eng.state_tick(now, 0.1, 0.0);
            assert!(eng.mint_tick(now, 0.0).minted.is_empty());
        }
    }

    #[test]
    fn triad_detected_once() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut eng = engine();
        eng.emit_signal(Some(SignalKind::Beacon), orchestrator(), 0.0, &mut rng);
        eng.emit_signal(Some(SignalKind::Lesson), orchestrator(), 0.5, &mut rng);
        eng.emit_signal(Some(SignalKind::Tension), orchestrator(), 1.0, &mut rng);

        let first = eng.mint_tick(1.5, 0.0);
        assert!(first.triad.is_some());
        let again = eng.mint_tick(2.0, 0.0);
        assert!(again.triad.is_none());
        assert_eq!(eng.triad_count(), 1);

        let triad_warrants: Vec<_> = eng
            .warrants()
            .iter()
            .filter(|w| w.minting_condition == MintingCondition::HarmonicTriad)
            .collect();
        assert_eq!(triad_warrants.len(), 1);
        assert_eq!(triad_warrants[0].band, Band::Social);
        assert_eq!(triad_warrants[0].source_signal_ids.len(), 3);
    }

    #[test]
    fn triad_outside_window_is_ignored() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut eng = engine();
        eng.emit_signal(Some(SignalKind::Beacon), orchestrator(), 0.0, &mut rng);
        eng.emit_signal(Some(SignalKind::Lesson), orchestrator(), 4.0, &mut rng);
        eng.emit_signal(Some(SignalKind::Tension), orchestrator(), 6.0, &mut rng);
        assert!(eng.mint_tick(6.0, 0.0).triad.is_none());
    }

    #[test]
    fn circuit_breaker_is_singular_and_sticky() {
        let mut eng = SignalEngine::new(SignalsConfig::default(), Mode::Gravity);
        let first = eng.mint_tick(0.5, 0.35);
        let second = eng.mint_tick(1.0, 0.35);
        assert_eq!(first.minted.len(), 1);
        assert!(second.minted.is_empty());

        // Risk falls back: the breaker stays until TTL or dismissal.
        eng.mint_tick(1.5, 0.05);
        eng.state_tick(1.5, 0.1, 0.0001);
        let breakers = eng
            .warrants()
            .iter()
            .filter(|w| w.minting_condition == MintingCondition::CircuitBreaker)
            .count();
        assert_eq!(breakers, 1);
        let w = &eng.warrants()[0];
        assert_eq!(w.band, Band::Primitive);
        assert!(w.source_signal_ids.is_empty());
    }

    #[test]
    fn dismiss_counts_once_and_removes_next_tick() {
        let mut eng = engine();
        let id = eng.mint_tick(0.0, 0.5).minted[0];
        assert!(eng.dismiss_warrant(id));
        assert!(!eng.dismiss_warrant(id));
        assert_eq!(eng.counters().dismissed, 1);
        assert!(eng.warrant(id).is_some());

        eng.state_tick(0.1, 0.1, 0.0001);
        assert!(eng.warrant(id).is_none());
        assert_eq!(eng.counters().expired, 0);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut eng = engine();
        assert!(!eng.dismiss_warrant(WarrantId(999)));
        assert!(!eng.acknowledge_warrant(WarrantId(999)));
        assert_eq!(eng.counters(), LifecycleCounters::default());
    }

    #[test]
    fn acknowledged_warrant_still_ages_out() {
        let mut eng = engine();
        let id = eng.mint_tick(0.0, 0.5).minted[0];
        assert!(eng.acknowledge_warrant(id));
        assert_eq!(eng.warrant(id).unwrap().status, WarrantStatus::Acknowledged);

        eng.state_tick(29.9, 0.1, 0.0001);
        assert!(eng.warrant(id).is_some());
        eng.state_tick(30.0, 0.1, 0.0001);
        assert!(eng.warrant(id).is_none());
        assert_eq!(eng.counters().expired, 1);
    }

    #[test]
    fn active_warrant_amplifies_its_source() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut linked = engine();
        let a = linked.emit_signal(Some(SignalKind::Beacon), orchestrator(), 0.0, &mut rng.clone());
        let mut unlinked = engine();
        let b = unlinked.emit_signal(Some(SignalKind::Beacon), orchestrator(), 0.0, &mut rng);

        linked.signals.iter_mut().for_each(|s| {
            s.volume = 0.81;
            s.max_volume = 1.0;
        });
        unlinked.signals.iter_mut().for_each(|s| {
            s.volume = 0.81;
            s.max_volume = 1.0;
        });
        linked.mint_tick(0.0, 0.0);

        linked.state_tick(0.1, 0.1, 0.0);
        unlinked.state_tick(0.1, 0.1, 0.0);
        assert!(linked.signal(a).unwrap().volume > unlinked.signal(b).unwrap().volume);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut eng = engine();
        eng.emit_signal(None, orchestrator(), 0.0, &mut rng);
        eng.mint_tick(0.0, 0.9);
        eng.reset(Mode::Light);
        let once = (
            eng.signals().to_vec(),
            eng.warrants().to_vec(),
            eng.triads().to_vec(),
            eng.counters(),
        );
        eng.reset(Mode::Light);
        let twice = (
            eng.signals().to_vec(),
            eng.warrants().to_vec(),
            eng.triads().to_vec(),
            eng.counters(),
        );
        assert_eq!(once, twice);
        assert!(once.0.is_empty() && once.1.is_empty() && once.2.is_empty());
        assert_eq!(eng.mode(), Mode::Light);
    }
}
