//! Ray/triangle intersection.
//!
//! Uses the Möller-Trumbore algorithm.

use glint_core::Triangle;
use glint_math::{DVec3, Ray, VectorExt, DIFF};

/// Closest-hit candidate produced by the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Arena index of the triangle
    pub triangle: usize,
    /// World-space hit point
    pub point: DVec3,
    /// Unit face normal, flipped to face against the ray
    pub normal: DVec3,
    /// Distance from the ray origin
    pub dist: f64,
    /// The ray hit the side the vertex winding faces
    pub front_face: bool,
}

/// Möller-Trumbore ray-triangle intersection.
///
/// Rejects near-parallel rays (|det| < DIFF), hits outside the triangle,
/// and hits at or behind the origin. The edge test is asymmetric: points on
/// the `p1`-`p3` edge (`u == 0`) count as inside, points on the `p1`-`p2`
/// edge (`v == 0`) do not.
pub fn intersect_triangle(ray: &Ray, triangle: &Triangle) -> Option<TriangleHit> {
    let [p1, p2, p3] = triangle.vertices;
    let edge1 = p2 - p1;
    let edge2 = p3 - p1;

    let h = ray.direction.cross(edge2);
    let det = edge1.dot(h);

    // Ray is parallel to triangle
    if det.abs() < DIFF {
        return None;
    }

    let f = 1.0 / det;
    let s = ray.origin - p1;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v <= 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t <= 0.0 {
        return None;
    }

    let point = ray.at(t);
    let face = edge1.cross(edge2).normalize_or_self();
    let front_face = !face.same_side(ray.direction, 0.0);
    let normal = if front_face { face } else { -face };

    Some(TriangleHit {
        triangle: triangle.id,
        point,
        normal,
        dist: (point - ray.origin).length(),
        front_face,
    })
}
