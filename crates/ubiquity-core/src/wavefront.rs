//! The wavefront propagation engine.
//!
//! [`WavefrontEngine`] owns every live front. Each call to
//! [`WavefrontEngine::advance`] runs three phases in order:
//!
//! 1. **Propagate** -- expanding fronts grow by their effective velocity and
//!    lose energy along the mode's falloff curve; beams translate along
//!    their heading and fade out over [`BEAM_LIFETIME_SECS`].
//! 2. **Spawn** -- every front that existed before this call is checked
//!    against each obstacle it has not yet interacted with. Walls echo
//!    acoustic fronts, lenses focus light, mirrors reflect light into
//!    beams. Children never take part in the tick that created them.
//! 3. **Prune** -- fronts that ran out of energy or outgrew the world are
//!    dropped, then the surviving children are appended.

use std::collections::BTreeSet;

use tracing::debug;
use ubiquity_types::{
    IdSequence, Mode, ObjectId, ObjectKind, Point, Wavefront, WavefrontId, WorldObject,
};
use ubiquity_world::geometry::{self, PX_PER_METER};
use ubiquity_world::physics;

/// Radius of a freshly emitted front.
pub const EMIT_RADIUS: f64 = 5.0;

/// Fronts below this energy are pruned.
pub const MIN_ENERGY: f64 = 0.01;

/// Seconds over which a mirror beam fades to nothing.
pub const BEAM_LIFETIME_SECS: f64 = 2.5;

/// A front interacts with a lens or mirror when its radius is within this
/// many pixels of the obstacle's distance.
const CONTACT_SLACK_PX: f64 = 15.0;

/// An echo spawns once the radius covers this share of the distance to the
/// wall's image point.
const ECHO_TRIGGER: f64 = 0.9;

/// Share of the parent's energy carried by an echo before distance loss.
const ECHO_EFFICIENCY: f64 = 0.35;

/// Distance (px) at which an echo's energy is halved.
const ECHO_FALLOFF_PX: f64 = 200.0;

/// Echo speed relative to the parent.
const ECHO_VELOCITY: f64 = 0.85;

/// Lens focus energy gain.
const LENS_GAIN: f64 = 1.6;

/// Lens focus speed relative to the parent.
const LENS_VELOCITY: f64 = 0.8;

/// Share of the parent's energy reflected by a mirror.
const MIRROR_EFFICIENCY: f64 = 0.85;

/// Starting radius of lens and mirror children.
const CHILD_RADIUS: f64 = 3.0;

/// Beams creep outward by this share of their travel.
const BEAM_GROWTH: f64 = 0.02;

/// Per-frame energy retention of gravity fronts.
const GRAVITY_RETENTION: f64 = 0.998;

/// Rate at which energy approaches the falloff target, per second.
const ENERGY_SMOOTHING: f64 = 2.0;

/// Inverse-square spread used by the front energy curve.
const ENERGY_SPREAD: f64 = 0.1;

/// Share of the radius at which gravity samples outer dilation.
const DILATION_PROBE: f64 = 0.7;

/// Counts from one [`WavefrontEngine::advance`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Children spawned from obstacle interactions.
    pub spawned: u32,
    /// Fronts dropped for low energy or excessive radius.
    pub pruned: u32,
}

/// Owns and advances the live wavefronts.
#[derive(Debug, Clone)]
pub struct WavefrontEngine {
    fronts: Vec<Wavefront>,
    ids: IdSequence,
    diagonal: f64,
}

impl WavefrontEngine {
    /// Create an empty engine for a world of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_sequence(width, height, IdSequence::new())
    }

    /// Create an empty engine drawing ids from `ids`.
    pub fn with_sequence(width: f64, height: f64, ids: IdSequence) -> Self {
        Self {
            fronts: Vec::new(),
            ids,
            diagonal: geometry::world_diagonal(width, height),
        }
    }

    /// Live fronts, oldest first.
    pub fn fronts(&self) -> &[Wavefront] {
        &self.fronts
    }

    /// Emit a new expanding front at `source`.
    pub fn emit(&mut self, source: Point, mode: Mode, now: f64) -> WavefrontId {
        let id = WavefrontId::next(&mut self.ids);
        self.fronts.push(Wavefront {
            id,
            source,
            radius: EMIT_RADIUS,
            energy: 1.0,
            velocity: physics::profile(mode).velocity,
            mode,
            is_echo: false,
            is_beam: false,
            angle: None,
            parent: None,
            spawned_from: BTreeSet::new(),
            created_at: now,
        });
        debug!(wavefront = %id, mode = %mode, x = source.x, y = source.y, "Wavefront emitted");
        id
    }

    /// Drop every front. Ids keep counting.
    pub fn clear(&mut self) {
        self.fronts.clear();
    }

    /// Advance every front by `dt` seconds ending at `now`.
    pub fn advance(&mut self, dt: f64, now: f64, objects: &[WorldObject]) -> AdvanceReport {
        let dt = dt.max(0.0);
        for front in &mut self.fronts {
            propagate(front, dt, now, objects);
        }

        let mut children = Vec::new();
        for front in &mut self.fronts {
            for object in objects {
                if front.spawned_from.contains(&object.id) {
                    continue;
                }
                if let Some(spawn) = interact(front, object) {
                    front.spawned_from.insert(object.id.clone());
                    children.push((front.id, object.id.clone(), spawn));
                }
            }
        }

        let before = self.fronts.len();
        let diagonal = self.diagonal;
        self.fronts.retain(|f| is_alive(f, diagonal));
        let pruned = before.saturating_sub(self.fronts.len());

        let mut spawned: u32 = 0;
        for (parent, origin, spawn) in children {
            let id = WavefrontId::next(&mut self.ids);
            let child = spawn.into_front(id, parent, origin, now);
            if is_alive(&child, diagonal) {
                debug!(
                    wavefront = %id,
                    parent = %parent,
                    echo = child.is_echo,
                    beam = child.is_beam,
                    energy = child.energy,
                    "Wavefront spawned"
                );
                self.fronts.push(child);
                spawned = spawned.saturating_add(1);
            }
        }

        AdvanceReport {
            spawned,
            pruned: u32::try_from(pruned).unwrap_or(u32::MAX),
        }
    }
}

/// A child front computed from a parent/obstacle interaction.
struct Spawn {
    source: Point,
    radius: f64,
    energy: f64,
    velocity: f64,
    mode: Mode,
    is_echo: bool,
    angle: Option<f64>,
}

impl Spawn {
    fn into_front(
        self,
        id: WavefrontId,
        parent: WavefrontId,
        origin: ObjectId,
        now: f64,
    ) -> Wavefront {
        Wavefront {
            id,
            source: self.source,
            radius: self.radius,
            energy: self.energy.clamp(0.0, 1.0),
            velocity: self.velocity,
            mode: self.mode,
            is_echo: self.is_echo,
            is_beam: self.angle.is_some(),
            angle: self.angle,
            parent: Some(parent),
            spawned_from: BTreeSet::from([origin]),
            created_at: now,
        }
    }
}

const fn is_alive(front: &Wavefront, diagonal: f64) -> bool {
    front.energy >= MIN_ENERGY && front.radius <= diagonal
}

fn propagate(front: &mut Wavefront, dt: f64, now: f64, objects: &[WorldObject]) {
    if front.is_beam {
        let age = (now - front.created_at).max(0.0);
        let (sin, cos) = front.angle.unwrap_or(0.0).sin_cos();
        let step = front.velocity * dt;
        front.source = front.source.offset(cos * step, sin * step);
        front.radius += step * BEAM_GROWTH;
        // Rescaling by the step's share of the fade keeps energy linear in age.
        let previous = beam_fade((age - dt).max(0.0));
        front.energy = if previous > 0.0 {
            (front.energy * beam_fade(age) / previous).clamp(0.0, 1.0)
        } else {
            0.0
        };
        return;
    }

    let velocity = effective_velocity(front, objects);
    front.radius += velocity * dt;

    let energy = if front.mode == Mode::Gravity {
        front.energy * GRAVITY_RETENTION
    } else {
        let distance_m = front.radius / PX_PER_METER;
        let falloff = 1.0 / (1.0 + ENERGY_SPREAD * distance_m * distance_m);
        let absorption = (-physics::profile(front.mode).absorption * distance_m).exp();
        let target = front.energy * falloff * absorption;
        front.energy - (front.energy - target) * (dt * ENERGY_SMOOTHING).min(1.0)
    };
    front.energy = energy.min(front.energy).max(0.0);
}

/// Share of a beam's spawn energy left at `age` seconds.
fn beam_fade(age: f64) -> f64 {
    (1.0 - age / BEAM_LIFETIME_SECS).clamp(0.0, 1.0)
}

/// Propagation speed of an expanding front. Masses slow gravity fronts by
/// the mean dilation at the centre and 70% out along the radius.
fn effective_velocity(front: &Wavefront, objects: &[WorldObject]) -> f64 {
    if front.mode != Mode::Gravity {
        return front.velocity;
    }
    let probe = front
        .source
        .offset(front.radius * DILATION_PROBE, front.radius * DILATION_PROBE);
    let center = physics::time_dilation(front.mode, front.source, objects);
    let outer = physics::time_dilation(front.mode, probe, objects);
    front.velocity * (center + outer) / 2.0
}

/// The child `front` spawns from `object`, if any.
fn interact(front: &Wavefront, object: &WorldObject) -> Option<Spawn> {
    let center = object.center();
    let distance = front.source.distance_to(center);
    let in_contact = (distance - front.radius).abs() < CONTACT_SLACK_PX;

    match (front.mode, object.kind) {
        (Mode::Acoustic, ObjectKind::Wall)
            if physics::profile(front.mode).echoes && !front.is_echo =>
        {
            let image = geometry::echo_point(front.source, object);
            (front.radius >= ECHO_TRIGGER * front.source.distance_to(image)).then(|| Spawn {
                source: image,
                radius: EMIT_RADIUS,
                energy: front.energy * ECHO_EFFICIENCY / (1.0 + distance / ECHO_FALLOFF_PX),
                velocity: front.velocity * ECHO_VELOCITY,
                mode: front.mode,
                is_echo: true,
                angle: None,
            })
        }
        (Mode::Light, ObjectKind::Lens) if !front.is_echo && in_contact => Some(Spawn {
            source: center,
            radius: CHILD_RADIUS,
            energy: (front.energy * LENS_GAIN).min(1.0),
            velocity: front.velocity * LENS_VELOCITY,
            mode: front.mode,
            is_echo: false,
            angle: None,
        }),
        (Mode::Light, ObjectKind::Mirror) if !front.is_beam && in_contact => Some(Spawn {
            source: center,
            radius: CHILD_RADIUS,
            energy: front.energy * MIRROR_EFFICIENCY,
            velocity: front.velocity,
            mode: front.mode,
            is_echo: false,
            angle: Some(geometry::reflection_angle(front.source, object)),
        }),
        _ => None,
    }
}
