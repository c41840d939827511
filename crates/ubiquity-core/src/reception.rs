//! Per-agent signal reception.
//!
//! Every frame each agent sums the strength of every front that has
//! reached it (radius within [`REACH_SLACK_PX`] of the agent's distance),
//! weighted by that front's energy and clipped to 1. An agent no front
//! reaches keeps 97% of its previous SNR. Gravity fronts also accumulate
//! an advisory phase delay from the time dilation at the agent.
//!
//! Results are written back onto the agent nodes as `last_snr` and a
//! strength tier.

use std::collections::BTreeMap;

use ubiquity_types::{
    AgentSignalState, Mode, Node, NodeId, NodeRole, StrengthTier, Wavefront, WorldObject,
};
use ubiquity_world::geometry;
use ubiquity_world::physics;

/// A front reaches an agent once its radius is within this many pixels of
/// the agent's distance.
pub const REACH_SLACK_PX: f64 = 8.0;

/// Share of the previous SNR kept when no front reaches an agent.
pub const SNR_RETENTION: f64 = 0.97;

/// Phase delay accrued per unit of lost dilation, per contributing front.
const PHASE_DELAY_SCALE: f64 = 500.0;

/// Reception state for every agent.
#[derive(Debug, Clone, Default)]
pub struct SignalReception {
    states: BTreeMap<NodeId, AgentSignalState>,
}

impl SignalReception {
    /// Create an empty reception map.
    pub const fn new() -> Self {
        Self {
            states: BTreeMap::new(),
        }
    }

    /// Latest state per agent.
    pub const fn states(&self) -> &BTreeMap<NodeId, AgentSignalState> {
        &self.states
    }

    /// State of one agent, if it has been computed.
    pub fn state(&self, agent: &NodeId) -> Option<&AgentSignalState> {
        self.states.get(agent)
    }

    /// Forget every agent's history.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Recompute every agent against the live fronts and write the result
    /// back onto the agent nodes.
    ///
    /// Agents that disappeared from `nodes` are dropped from the map.
    pub fn update(
        &mut self,
        fronts: &[Wavefront],
        nodes: &mut [Node],
        objects: &[WorldObject],
        now: f64,
    ) {
        let mut next = BTreeMap::new();
        for node in nodes.iter_mut().filter(|n| n.role == NodeRole::Agent) {
            let state = receive(fronts, node, objects, self.states.get(&node.id), now);
            node.last_snr = state.snr;
            node.strength = StrengthTier::from_snr(state.snr);
            next.insert(node.id.clone(), state);
        }
        self.states = next;
    }
}

/// Reception at a single agent given its previous state.
pub fn receive(
    fronts: &[Wavefront],
    agent: &Node,
    objects: &[WorldObject],
    previous: Option<&AgentSignalState>,
    now: f64,
) -> AgentSignalState {
    let mut total = 0.0;
    let mut hits: u32 = 0;
    let mut phase_delay = 0.0;

    for front in fronts {
        let distance = front.source.distance_to(agent.position);
        if front.radius < distance - REACH_SLACK_PX {
            continue;
        }
        let attenuation = physics::attenuation(front.mode, front.source, agent.position, objects);
        let strength =
            physics::signal_strength(front.mode, geometry::to_meters(distance), attenuation);
        total += strength * front.energy;
        hits = hits.saturating_add(1);

        if front.mode == Mode::Gravity {
            let dilation = physics::time_dilation(front.mode, agent.position, objects);
            phase_delay += (1.0 - dilation) * PHASE_DELAY_SCALE;
        }
    }

    let previous_snr = previous.map_or(0.0, |p| p.snr);
    let (snr, received_at) = if hits > 0 {
        (total.clamp(0.0, 1.0), Some(now))
    } else {
        (previous_snr * SNR_RETENTION, previous.and_then(|p| p.received_at))
    };

    AgentSignalState {
        agent_id: agent.id.clone(),
        snr,
        peak_snr: previous.map_or(snr, |p| p.peak_snr.max(snr)),
        received_at,
        phase_delay,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use ubiquity_types::{ObjectKind, Point, WavefrontId};

    use super::*;

    fn agent(id: &str, x: f64, y: f64) -> Node {
        Node {
            id: NodeId::new(id),
            role: NodeRole::Agent,
            position: Point::new(x, y),
            capabilities: Vec::new(),
            load: 0.5,
            last_snr: 0.0,
            strength: StrengthTier::Weak,
            actor_group: None,
        }
    }

    fn front(mode: Mode, radius: f64, energy: f64) -> Wavefront {
        Wavefront {
            id: WavefrontId(0),
            source: Point::new(400.0, 280.0),
            radius,
            energy,
            velocity: 200.0,
            mode,
            is_echo: false,
            is_beam: false,
            angle: None,
            parent: None,
            spawned_from: BTreeSet::new(),
            created_at: 0.0,
        }
    }

    #[test]
    fn unreached_agent_hears_nothing() {
        let node = agent("a", 600.0, 280.0);
        let state = receive(&[front(Mode::Acoustic, 50.0, 1.0)], &node, &[], None, 1.0);
        assert!(state.snr.abs() < f64::EPSILON);
        assert!(state.received_at.is_none());
    }

    #[test]
    fn slack_lets_a_front_reach_early() {
        let node = agent("a", 500.0, 280.0);
        let state = receive(&[front(Mode::Acoustic, 93.0, 1.0)], &node, &[], None, 1.0);
        assert!(state.snr > 0.0);
        assert_eq!(state.received_at, Some(1.0));
    }

    #[test]
    fn contributions_sum_and_clip() {
        let node = agent("a", 460.0, 280.0);
        let one = receive(&[front(Mode::Light, 80.0, 0.3)], &node, &[], None, 0.0);
        let two = receive(
            &[front(Mode::Light, 80.0, 0.3), front(Mode::Light, 80.0, 0.3)],
            &node,
            &[],
            None,
            0.0,
        );
        assert!((two.snr - (one.snr * 2.0).min(1.0)).abs() < 1e-12);

        let many: Vec<Wavefront> = (0..10).map(|_| front(Mode::Light, 80.0, 1.0)).collect();
        assert!((receive(&many, &node, &[], None, 0.0).snr - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn silence_decays_previous_snr() {
        let node = agent("a", 700.0, 280.0);
        let previous = AgentSignalState {
            agent_id: node.id.clone(),
            snr: 0.5,
            peak_snr: 0.8,
            received_at: Some(2.0),
            phase_delay: 0.0,
        };
        let state = receive(&[], &node, &[], Some(&previous), 3.0);
        assert!((state.snr - 0.485).abs() < 1e-12);
        assert!((state.peak_snr - 0.8).abs() < f64::EPSILON);
        assert_eq!(state.received_at, Some(2.0));
    }

    #[test]
    fn wall_muffles_reception() {
        let node = agent("a", 640.0, 280.0);
        let wall = WorldObject::new("gate", ObjectKind::Wall, 460.0, 200.0, 12.0, 160.0);
        let fronts = [front(Mode::Acoustic, 250.0, 1.0)];
        let open = receive(&fronts, &node, &[], None, 0.0);
        let blocked = receive(&fronts, &node, std::slice::from_ref(&wall), None, 0.0);
        assert!(blocked.snr < open.snr);
        assert!((blocked.snr - open.snr * 0.6).abs() < 1e-9);
    }

    #[test]
    fn gravity_accumulates_phase_delay() {
        let node = agent("a", 500.0, 280.0);
        let mass = WorldObject::new("invariant", ObjectKind::Mass, 480.0, 260.0, 40.0, 40.0);
        let fronts = [front(Mode::Gravity, 120.0, 1.0), front(Mode::Gravity, 120.0, 1.0)];
        let state = receive(&fronts, &node, std::slice::from_ref(&mass), None, 0.0);
        assert!((state.snr - 1.0).abs() < f64::EPSILON);
        assert!(state.phase_delay > 0.0);

        let flat = receive(&fronts, &node, &[], None, 0.0);
        assert!(flat.phase_delay.abs() < f64::EPSILON);
    }

    #[test]
    fn update_writes_back_onto_agents() {
        let mut nodes = vec![agent("near", 420.0, 280.0), agent("far", 790.0, 550.0)];
        let mut reception = SignalReception::new();
        reception.update(&[front(Mode::Acoustic, 30.0, 1.0)], &mut nodes, &[], 0.5);

        let near = nodes.first().unwrap();
        assert!(near.last_snr > 0.6);
        assert_eq!(near.strength, StrengthTier::Strong);
        assert_eq!(nodes.get(1).unwrap().strength, StrengthTier::Weak);
        assert_eq!(reception.states().len(), 2);
        assert!(reception.state(&NodeId::new("near")).is_some_and(|s| s.peak_snr > 0.6));
    }
}
