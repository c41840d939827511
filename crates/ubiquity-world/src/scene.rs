//! Default scene for the Ubiquity simulation.
//!
//! One orchestrator sits at the centre of the 800x560 world, surrounded by
//! five agent clusters (13 agents). Each mode has its own set of three
//! starting obstacles: walls for acoustic, lenses and a mirror for light,
//! and invariant masses for gravity.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ubiquity_types::{Mode, Node, NodeId, NodeRole, ObjectKind, Point, StrengthTier, WorldObject};

/// Identifier of the singleton orchestrator node.
pub const ORCHESTRATOR_ID: &str = "orchestrator";

/// Keep agents at least this far from the world edge.
const EDGE_MARGIN: f64 = 16.0;

/// Subsystem capabilities an agent may be seeded with.
const SUBSYSTEMS: [&str; 5] = [
    "ghost_chorus",
    "economy_whisper",
    "drift_tracker",
    "ecotone_gate",
    "epitaph_extractor",
];

/// A cluster of agents scattered around a centre.
struct Cluster {
    center: Point,
    count: u32,
    group: &'static str,
}

const CLUSTERS: [Cluster; 5] = [
    Cluster {
        center: Point::new(310.0, 210.0),
        count: 3,
        group: "ghost_chorus",
    },
    Cluster {
        center: Point::new(500.0, 230.0),
        count: 3,
        group: "economy_whisper",
    },
    Cluster {
        center: Point::new(360.0, 370.0),
        count: 3,
        group: "ecotone_gate",
    },
    Cluster {
        center: Point::new(470.0, 360.0),
        count: 2,
        group: "drift_tracker",
    },
    Cluster {
        center: Point::new(270.0, 300.0),
        count: 2,
        group: "epitaph_extractor",
    },
];

/// Nodes and obstacles making up a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// The orchestrator followed by every agent.
    pub nodes: Vec<Node>,
    /// World obstacles.
    pub objects: Vec<WorldObject>,
}

impl Scene {
    /// The orchestrator node, if the scene has one.
    pub fn orchestrator(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.role == NodeRole::Orchestrator)
    }

    /// Iterate over agent nodes.
    pub fn agents(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.role == NodeRole::Agent)
    }
}

/// Seed a fresh scene for `mode` in a world of the given size.
pub fn seed_scene(mode: Mode, width: f64, height: f64, rng: &mut impl Rng) -> Scene {
    let mut nodes = vec![orchestrator_node()];
    nodes.extend(seed_agents(width, height, rng));
    let objects = initial_objects(mode);
    debug!(
        mode = %mode,
        nodes = nodes.len(),
        objects = objects.len(),
        "Scene seeded"
    );
    Scene { nodes, objects }
}

/// The orchestrator node at the centre of the default world.
pub fn orchestrator_node() -> Node {
    Node {
        id: NodeId::new(ORCHESTRATOR_ID),
        role: NodeRole::Orchestrator,
        position: Point::new(400.0, 280.0),
        capabilities: vec!["broadcast".to_owned()],
        load: 0.0,
        last_snr: 1.0,
        strength: StrengthTier::Strong,
        actor_group: None,
    }
}

/// Scatter the agent clusters, clamped inside the world bounds.
pub fn seed_agents(width: f64, height: f64, rng: &mut impl Rng) -> Vec<Node> {
    let max_x = (width - EDGE_MARGIN).max(EDGE_MARGIN);
    let max_y = (height - EDGE_MARGIN).max(EDGE_MARGIN);
    let mut agents = Vec::new();
    let mut next_index: u32 = 0;

    for cluster in &CLUSTERS {
        for _ in 0..cluster.count {
            let angle = rng.random_range(0.0..std::f64::consts::TAU);
            let distance = 10.0 + rng.random_range(0.0..36.0);
            let (sin, cos) = angle.sin_cos();
            let position = Point::new(
                (cluster.center.x + cos * distance).clamp(EDGE_MARGIN, max_x),
                (cluster.center.y + sin * distance).clamp(EDGE_MARGIN, max_y),
            );

            agents.push(Node {
                id: NodeId::new(format!("agent-{next_index}")),
                role: NodeRole::Agent,
                position,
                capabilities: sample_capabilities(rng),
                load: rng.random_range(0.1..0.9),
                last_snr: 0.0,
                strength: StrengthTier::Weak,
                actor_group: Some(cluster.group.to_owned()),
            });
            next_index = next_index.saturating_add(1);
        }
    }

    agents
}

/// Two or three distinct subsystem capabilities.
fn sample_capabilities(rng: &mut impl Rng) -> Vec<String> {
    let mut pool = SUBSYSTEMS;
    pool.shuffle(rng);
    let take = if rng.random_bool(0.5) { 3 } else { 2 };
    pool.iter().take(take).map(|s| (*s).to_owned()).collect()
}

/// The three starting obstacles for a mode.
pub fn initial_objects(mode: Mode) -> Vec<WorldObject> {
    match mode {
        Mode::Acoustic => vec![
            WorldObject::new("gate-1", ObjectKind::Wall, 100.0, 80.0, 130.0, 14.0),
            WorldObject::new("gate-2", ObjectKind::Wall, 640.0, 210.0, 16.0, 110.0),
            WorldObject::new("gate-3", ObjectKind::Wall, 220.0, 450.0, 90.0, 14.0),
        ],
        Mode::Light => vec![
            WorldObject::new("lens-1", ObjectKind::Lens, 120.0, 110.0, 44.0, 44.0),
            WorldObject::new("mirror-1", ObjectKind::Mirror, 610.0, 160.0, 70.0, 22.0),
            WorldObject::new("lens-2", ObjectKind::Lens, 180.0, 430.0, 36.0, 36.0),
        ],
        Mode::Gravity => vec![
            WorldObject::new("invariant-1", ObjectKind::Mass, 140.0, 130.0, 56.0, 56.0),
            WorldObject::new("invariant-2", ObjectKind::Mass, 590.0, 190.0, 68.0, 68.0),
            WorldObject::new("invariant-3", ObjectKind::Mass, 210.0, 410.0, 48.0, 48.0),
        ],
    }
}

/// A mode-appropriate obstacle placed uniformly in `[100, 700) x [80, 480)`.
///
/// `sequence` disambiguates ids of obstacles added during one session.
pub fn random_object(mode: Mode, sequence: u64, rng: &mut impl Rng) -> WorldObject {
    let x = rng.random_range(100.0..700.0);
    let y = rng.random_range(80.0..480.0);
    match mode {
        Mode::Acoustic => {
            WorldObject::new(format!("gate-x{sequence}"), ObjectKind::Wall, x, y, 60.0, 12.0)
        }
        Mode::Light => {
            WorldObject::new(format!("lens-x{sequence}"), ObjectKind::Lens, x, y, 34.0, 34.0)
        }
        Mode::Gravity => WorldObject::new(
            format!("invariant-x{sequence}"),
            ObjectKind::Mass,
            x,
            y,
            46.0,
            46.0,
        ),
    }
}
