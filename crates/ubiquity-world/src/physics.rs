//! Mode-specific physics: propagation profiles, attenuation, falloff, and
//! gravitational time dilation.
//!
//! # Profiles
//!
//! | Mode     | Velocity (px/s) | Absorption (1/m) | Echoes |
//! |----------|-----------------|------------------|--------|
//! | acoustic | 200             | 0.012            | yes    |
//! | light    | 4000            | 0.0002           | no     |
//! | gravity  | 800             | 0                | no     |
//!
//! Velocities are scaled so every front stays visible while crossing the
//! 800 px world.

use ubiquity_types::{Mode, ObjectKind, Point, WorldObject};

use crate::geometry::{self, MIN_DISTANCE_PX};

/// Signal multiplier applied per wall crossing on the source-agent segment.
pub const MUFFLING_PER_HOP: f64 = 0.6;

/// Below this distance (meters) the falloff curve is skipped.
const NEAR_FIELD_METERS: f64 = 0.5;

/// Propagation parameters for one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsProfile {
    /// Nominal front velocity in pixels per second.
    pub velocity: f64,
    /// Exponential absorption coefficient per meter.
    pub absorption: f64,
    /// Whether walls produce echoes.
    pub echoes: bool,
}

/// The physics profile for a mode.
pub const fn profile(mode: Mode) -> PhysicsProfile {
    match mode {
        Mode::Acoustic => PhysicsProfile {
            velocity: 200.0,
            absorption: 0.012,
            echoes: true,
        },
        Mode::Light => PhysicsProfile {
            velocity: 4000.0,
            absorption: 0.0002,
            echoes: false,
        },
        Mode::Gravity => PhysicsProfile {
            velocity: 800.0,
            absorption: 0.0,
            echoes: false,
        },
    }
}

/// Attenuation between a source and a receiver.
///
/// Acoustic fronts are muffled by 0.6 per wall crossed. Light carries its
/// loss in its own absorption curve and gravity bypasses obstacles, so both
/// return 1.
pub fn attenuation(mode: Mode, source: Point, receiver: Point, objects: &[WorldObject]) -> f64 {
    match mode {
        Mode::Acoustic => {
            let crossings = geometry::wall_crossings(source, receiver, objects);
            MUFFLING_PER_HOP.powi(i32::try_from(crossings).unwrap_or(i32::MAX))
        }
        Mode::Light | Mode::Gravity => 1.0,
    }
}

/// Received signal strength at `distance_m` meters, clipped to `[0, 1]`.
///
/// Gravity has no distance falloff. Inside the near field the attenuation
/// factor is returned unchanged.
pub fn signal_strength(mode: Mode, distance_m: f64, attenuation: f64) -> f64 {
    let (spread, gain) = match mode {
        Mode::Gravity => return 1.0,
        Mode::Acoustic => (1.0, 8.0),
        Mode::Light => (0.3, 4.0),
    };
    if distance_m < NEAR_FIELD_METERS {
        return attenuation.clamp(0.0, 1.0);
    }
    let inverse_square = 1.0 / (1.0 + distance_m * distance_m * spread);
    let absorption = (-profile(mode).absorption * distance_m).exp();
    (inverse_square * absorption * attenuation * gain).clamp(0.0, 1.0)
}

/// Schwarzschild-style time dilation at `point`, in `(0, 1]`.
///
/// Each mass contributes a factor `1 / (1 + rs / (2 * max(d, 10)))` where
/// `rs` is 15% of the mass's combined width and height. Outside gravity
/// mode the result is always 1.
pub fn time_dilation(mode: Mode, point: Point, objects: &[WorldObject]) -> f64 {
    if mode != Mode::Gravity {
        return 1.0;
    }
    objects
        .iter()
        .filter(|obj| obj.kind == ObjectKind::Mass)
        .fold(1.0, |dilation, mass| {
            let rs = (mass.width + mass.height).max(0.0) * 0.15;
            let distance = point.distance_to(mass.center()).max(MIN_DISTANCE_PX);
            dilation / (1.0 + rs / (2.0 * distance))
        })
}
