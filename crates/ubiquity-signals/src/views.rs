//! Pure derived views over the signal engine's state.
//!
//! Nothing here is cached: each function recomputes its view from the
//! slices it is handed, so a view can never go stale relative to the
//! snapshot it was computed from.

use std::collections::BTreeMap;

use ubiquity_types::{
    Band, LoudestSignal, Signal, SignalCensus, SignalKind, Warrant, WarrantLifecycle,
    WarrantStatus,
};

use crate::engine::LifecycleCounters;

/// Count live signals by kind and band and find the loudest one.
///
/// Every kind and band appears in the maps, with zero when absent.
pub fn census(signals: &[Signal]) -> SignalCensus {
    let mut by_kind: BTreeMap<SignalKind, u32> = SignalKind::ALL.iter().map(|k| (*k, 0)).collect();
    let mut by_band: BTreeMap<Band, u32> = Band::ALL.iter().map(|b| (*b, 0)).collect();

    for signal in signals {
        if let Some(count) = by_kind.get_mut(&signal.kind) {
            *count = count.saturating_add(1);
        }
        if let Some(count) = by_band.get_mut(&signal.band) {
            *count = count.saturating_add(1);
        }
    }

    let loudest = signals
        .iter()
        .max_by(|a, b| a.volume.total_cmp(&b.volume))
        .map(|s| LoudestSignal {
            id: s.id,
            kind: s.kind,
            volume: s.volume,
        });

    SignalCensus {
        by_kind,
        by_band,
        loudest,
    }
}

/// Warrant lifecycle counters: live statuses counted from `warrants`,
/// retirements taken from `counters`.
pub fn warrant_lifecycle(warrants: &[Warrant], counters: LifecycleCounters) -> WarrantLifecycle {
    let count = |status: WarrantStatus| {
        u32::try_from(warrants.iter().filter(|w| w.status == status).count()).unwrap_or(u32::MAX)
    };
    WarrantLifecycle {
        active: count(WarrantStatus::Active),
        acknowledged: count(WarrantStatus::Acknowledged),
        dismissed: counters.dismissed,
        expired: counters.expired,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ubiquity_types::{Mode, NodeId};

    use super::*;
    use crate::config::SignalsConfig;
    use crate::engine::SignalEngine;

    #[test]
    fn empty_census_lists_every_bucket() {
        let c = census(&[]);
        assert_eq!(c.by_kind.len(), 4);
        assert_eq!(c.by_band.len(), 4);
        assert!(c.by_kind.values().all(|n| *n == 0));
        assert!(c.loudest.is_none());
    }

    #[test]
    fn census_counts_and_finds_loudest() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut eng = SignalEngine::new(SignalsConfig::default(), Mode::Light);
        let src = NodeId::new("orchestrator");
        eng.emit_signal(Some(SignalKind::Tension), src.clone(), 0.0, &mut rng);
        eng.emit_signal(Some(SignalKind::Tension), src.clone(), 0.0, &mut rng);
        eng.emit_signal(Some(SignalKind::Beacon), src, 0.0, &mut rng);

        let c = census(eng.signals());
        assert_eq!(c.by_kind.get(&SignalKind::Tension), Some(&2));
        assert_eq!(c.by_kind.get(&SignalKind::Beacon), Some(&1));
        assert_eq!(c.by_band.get(&Band::Cognitive), Some(&3));

        let max = eng
            .signals()
            .iter()
            .map(|s| s.volume)
            .fold(f64::MIN, f64::max);
        assert!(c.loudest.is_some_and(|l| (l.volume - max).abs() < 1e-12));
    }

    #[test]
    fn lifecycle_mixes_live_and_retired() {
        let mut eng = SignalEngine::new(SignalsConfig::default(), Mode::Gravity);
        let breaker = eng.mint_tick(0.0, 0.4).minted;
        let id = breaker.first().copied();
        assert!(id.is_some_and(|id| eng.acknowledge_warrant(id)));

        let view = warrant_lifecycle(eng.warrants(), eng.counters());
        assert_eq!(view.active, 0);
        assert_eq!(view.acknowledged, 1);

        eng.state_tick(31.0, 0.1, 0.0001);
        let view = warrant_lifecycle(eng.warrants(), eng.counters());
        assert_eq!(view.acknowledged, 0);
        assert_eq!(view.expired, 1);
        assert_eq!(view.dismissed, 0);
    }
}
