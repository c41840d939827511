//! Planar geometry helpers shared by propagation and reception.
//!
//! Everything here is pure and works in world pixels. Degenerate input
//! (coincident points, zero-sized rectangles, parallel segments) yields a
//! conservative answer rather than a NaN.

use ubiquity_types::{ObjectKind, Point, WorldObject};

/// Pixels per simulated meter. Signal falloff curves are expressed in meters.
pub const PX_PER_METER: f64 = 60.0;

/// Floor applied to distances used as divisors.
pub const MIN_DISTANCE_PX: f64 = 10.0;

/// Convert a pixel distance to meters.
pub const fn to_meters(pixels: f64) -> f64 {
    pixels / PX_PER_METER
}

/// Length of the world diagonal; fronts wider than this are pruned.
pub fn world_diagonal(width: f64, height: f64) -> f64 {
    width.hypot(height)
}

/// Whether segment `a1-a2` intersects segment `b1-b2`, endpoints included.
///
/// Parallel and collinear segments are treated as non-intersecting.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let denominator = (a1.x - a2.x) * (b1.y - b2.y) - (a1.y - a2.y) * (b1.x - b2.x);
    if denominator.abs() < f64::EPSILON {
        return false;
    }
    let t = ((a1.x - b1.x) * (b1.y - b2.y) - (a1.y - b1.y) * (b1.x - b2.x)) / denominator;
    let u = -((a1.x - a2.x) * (a1.y - b1.y) - (a1.y - a2.y) * (a1.x - b1.x)) / denominator;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

/// Whether the segment `from-to` crosses any edge of the object's rectangle.
///
/// A segment lying entirely inside the rectangle does not cross it.
pub fn segment_crosses_rect(from: Point, to: Point, rect: &WorldObject) -> bool {
    let top_left = Point::new(rect.x, rect.y);
    let top_right = Point::new(rect.x + rect.width, rect.y);
    let bottom_right = Point::new(rect.x + rect.width, rect.y + rect.height);
    let bottom_left = Point::new(rect.x, rect.y + rect.height);

    [
        (top_left, top_right),
        (top_right, bottom_right),
        (bottom_right, bottom_left),
        (bottom_left, top_left),
    ]
    .into_iter()
    .any(|(edge_start, edge_end)| segments_intersect(from, to, edge_start, edge_end))
}

/// Number of walls the segment `from-to` passes through.
pub fn wall_crossings(from: Point, to: Point, objects: &[WorldObject]) -> u32 {
    let count = objects
        .iter()
        .filter(|obj| obj.kind == ObjectKind::Wall)
        .filter(|wall| segment_crosses_rect(from, to, wall))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Surface angle of a mirror in radians.
///
/// Uses the explicit angle when set; otherwise the surface runs along the
/// longer side (horizontal when wider than tall).
pub fn surface_angle(mirror: &WorldObject) -> f64 {
    mirror.surface_angle.unwrap_or(if mirror.width > mirror.height {
        0.0
    } else {
        std::f64::consts::FRAC_PI_2
    })
}

/// Heading of a specular reflection off `mirror` for a front centred at
/// `source`, in radians.
///
/// The incident direction runs from the source toward the mirror centre and
/// is reflected about the surface normal: `r = i - 2(i.n)n`. A source at the
/// mirror centre falls back to a unit incident vector along x.
pub fn reflection_angle(source: Point, mirror: &WorldObject) -> f64 {
    let center = mirror.center();
    let normal_angle = surface_angle(mirror) + std::f64::consts::FRAC_PI_2;
    let (ny, nx) = normal_angle.sin_cos();

    let dx = center.x - source.x;
    let dy = center.y - source.y;
    let len = dx.hypot(dy);
    let (ix, iy) = if len > f64::EPSILON {
        (dx / len, dy / len)
    } else {
        (1.0, 0.0)
    };

    let dot = ix * nx + iy * ny;
    let rx = ix - 2.0 * dot * nx;
    let ry = iy - 2.0 * dot * ny;
    ry.atan2(rx)
}

/// Mirror-image point of `source` through the centre of `wall`, offset 10%
/// further along the same line.
pub fn echo_point(source: Point, wall: &WorldObject) -> Point {
    let center = wall.center();
    let dx = center.x - source.x;
    let dy = center.y - source.y;
    Point::new(center.x + dx * 0.1, center.y + dy * 0.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(x: f64, y: f64, w: f64, h: f64) -> WorldObject {
        WorldObject::new("w", ObjectKind::Wall, x, y, w, h)
    }

    #[test]
    fn crossing_segments_intersect() {
        let hit = segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        );
        assert!(hit);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let hit = segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
        );
        assert!(!hit);
    }

    #[test]
    fn wall_between_points_is_counted_once() {
        let objects = vec![wall(490.0, 200.0, 10.0, 160.0)];
        let n = wall_crossings(Point::new(400.0, 280.0), Point::new(600.0, 280.0), &objects);
        assert_eq!(n, 1);
    }

    #[test]
    fn non_wall_objects_are_ignored() {
        let lens = WorldObject::new("l", ObjectKind::Lens, 490.0, 200.0, 10.0, 160.0);
        let n = wall_crossings(Point::new(400.0, 280.0), Point::new(600.0, 280.0), &[lens]);
        assert_eq!(n, 0);
    }

    #[test]
    fn zero_sized_wall_does_not_panic() {
        let objects = vec![wall(500.0, 280.0, 0.0, 0.0)];
        let n = wall_crossings(Point::new(400.0, 280.0), Point::new(600.0, 280.0), &objects);
        assert!(n <= 1);
    }

    #[test]
    fn horizontal_mirror_reflects_vertical_incidence_back() {
        // Source directly above a horizontal mirror: the beam heads back up.
        let mirror = WorldObject::new("m", ObjectKind::Mirror, 90.0, 100.0, 20.0, 4.0);
        let angle = reflection_angle(Point::new(100.0, 0.0), &mirror);
        assert!((angle + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn tall_mirror_surface_is_vertical() {
        let mirror = WorldObject::new("m", ObjectKind::Mirror, 0.0, 0.0, 4.0, 40.0);
        assert!((surface_angle(&mirror) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn echo_point_lies_past_the_wall() {
        let w = wall(190.0, 95.0, 20.0, 10.0);
        let p = echo_point(Point::new(100.0, 100.0), &w);
        assert!((p.x - 210.0).abs() < 1e-9);
        assert!((p.y - 100.0).abs() < 1e-9);
    }
}
