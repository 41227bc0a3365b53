// GEOMETRY

use bevy::math::Vec2;

/// find the intersection between two line segments, lookup Cramer's rule
/// https://cp-algorithms.com/geometry/lines-intersection.html
/// # Returns `Some(Vec2)` if the segments intersect, `None` when they are parallel or miss each other
pub fn segment_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let s1 = a2 - a1; // direction vector of segment a
    let s2 = b2 - b1; // direction vector of segment b

    let denom = s1.x * s2.y - s2.x * s1.y; // determinant of 2x2 matrix

    // parallel or coincident lines
    if denom.abs() < 1e-6 {
        return None;
    }

    let s = (s1.x * (a1.y - b1.y) - s1.y * (a1.x - b1.x)) / denom;
    let t = (s2.x * (a1.y - b1.y) - s2.y * (a1.x - b1.x)) / denom;

    // check if intersection is within both segments
    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        Some(a1 + t * s1)
    } else {
        None
    }
}

/// Copy the vector and rotate it counter-clockwise by `radians`.
pub fn rotate(v: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(v)
}

/// Unsigned angle in degrees (0..=180) between two vectors, 0 if either is degenerate.
pub fn angle_between_degrees(a: Vec2, b: Vec2) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom < 1e-15 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// A convex polygon with its edge normals, used for overlap tests only.
///
/// Corners must be convex and wound consistently, the separating axis test is
/// meaningless otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingPolygon {
    corners: Vec<Vec2>,
    normals: Vec<Vec2>,
}

impl BoundingPolygon {
    pub fn new(corners: Vec<Vec2>) -> Self {
        let mut normals: Vec<Vec2> = Vec::with_capacity(corners.len());

        // edge i runs from corner i-1 to corner i, the first one closes the loop
        for i in 0..corners.len() {
            let prev = if i == 0 { corners.len() - 1 } else { i - 1 };
            let edge = corners[i] - corners[prev];
            let normal = Vec2::new(edge.y, -edge.x).normalize_or_zero();

            // zero length edges give no axis
            if normal == Vec2::ZERO || normals.contains(&normal) {
                continue;
            }
            normals.push(normal);
        }

        Self { corners, normals }
    }

    /// Thin rectangle around the segment `a..b`, inflated by `radius` on both sides.
    pub fn around_segment(a: Vec2, b: Vec2, radius: f32) -> Self {
        let direction = (b - a).normalize_or_zero();
        let perpendicular = direction.perp();
        Self::new(vec![
            a - perpendicular * radius,
            a + perpendicular * radius,
            b + perpendicular * radius,
            b - perpendicular * radius,
        ])
    }

    /// Rectangle of `size` (x across, y along) centered on `center`, rotated by `rotation` radians.
    pub fn rotated_rect(center: Vec2, size: Vec2, rotation: f32) -> Self {
        let half = size * 0.5;
        let turn = Vec2::from_angle(rotation);
        let corners = [
            Vec2::new(half.x, half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(-half.x, -half.y),
            Vec2::new(-half.x, half.y),
        ]
        .into_iter()
        .map(|corner| center + turn.rotate(corner))
        .collect();
        Self::new(corners)
    }

    pub fn corners(&self) -> &[Vec2] {
        &self.corners
    }

    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    /// Separating axis test. Touching polygons count as colliding.
    pub fn collides(&self, other: &BoundingPolygon) -> bool {
        if self.corners.is_empty() || other.corners.is_empty() {
            return false;
        }

        // as soon as one axis separates the projections there is no collision
        for axis in self.normals.iter().chain(other.normals.iter()) {
            let (min_a, max_a) = self.project(*axis);
            let (min_b, max_b) = other.project(*axis);
            if max_a < min_b || max_b < min_a {
                return false;
            }
        }

        true
    }

    fn project(&self, axis: Vec2) -> (f32, f32) {
        self.corners
            .iter()
            .map(|corner| corner.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| (min.min(p), max.max(p)))
    }
}
