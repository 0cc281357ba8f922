//! Vector helpers used by the shading and intersection code.

use crate::{DVec2, DVec3, DVec4, DIFF};

/// RGBA color, each channel nominally in [0, 1].
pub type Color = DVec4;

/// Clamp every channel of a color to [0, 1]; NaN channels become 0.
#[inline]
pub fn limit_color(c: Color) -> Color {
    let limit = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    Color::new(limit(c.x), limit(c.y), limit(c.z), limit(c.w))
}

/// Extension trait for DVec3 with the refraction formula and side tests.
///
/// Mirror reflection is glam's own `DVec3::reflect`. glam's `refract` takes
/// an index ratio and a normal facing the ray, so the tracer's variant is
/// named `refract_ior` to keep the two apart.
pub trait VectorExt {
    /// Unit-length copy, or the vector itself when its length is zero.
    fn normalize_or_self(self) -> DVec3;

    /// Snell refraction of the incoming direction `self` through a surface
    /// with outward `normal` and index of refraction `ior`. Entering and
    /// leaving are told apart by the sign of `dot(self, normal)`. Total
    /// internal reflection yields the zero vector.
    fn refract_ior(self, normal: DVec3, ior: f64) -> DVec3;

    /// Signed half-space test: `dot(self, other) > bias`.
    fn same_side(self, other: DVec3, bias: f64) -> bool;
}

impl VectorExt for DVec3 {
    #[inline]
    fn normalize_or_self(self) -> DVec3 {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            self / len
        }
    }

    fn refract_ior(self, normal: DVec3, ior: f64) -> DVec3 {
        let mut cos_i = self.dot(normal).clamp(-1.0, 1.0);
        let mut eta_i = 1.0;
        let mut eta_t = ior;
        let mut n = normal;

        if cos_i < 0.0 {
            // Entering the medium
            cos_i = -cos_i;
        } else {
            std::mem::swap(&mut eta_i, &mut eta_t);
            n = -normal;
        }

        let eta = eta_i / eta_t;
        let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
        if k < 0.0 {
            return DVec3::ZERO;
        }
        self * eta + n * (eta * cos_i - k.sqrt())
    }

    #[inline]
    fn same_side(self, other: DVec3, bias: f64) -> bool {
        self.dot(other) > bias
    }
}

/// Barycentric weights of a point relative to a triangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Barycentric {
    /// Weight of the first vertex
    pub u: f64,
    /// Weight of the second vertex
    pub v: f64,
    /// Weight of the third vertex
    pub w: f64,
    /// Whether the point falls inside the triangle (epsilon inclusive)
    pub inside: bool,
}

impl Barycentric {
    /// Blend three per-vertex values with these weights.
    #[inline]
    pub fn blend3(&self, a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
        a * self.u + b * self.v + c * self.w
    }

    #[inline]
    pub fn blend2(&self, a: DVec2, b: DVec2, c: DVec2) -> DVec2 {
        a * self.u + b * self.v + c * self.w
    }
}

/// Barycentric coordinates of `p` in triangle (p1, p2, p3).
///
/// The triangle is projected onto the coordinate plane that drops the
/// dominant axis of its normal, which keeps the 2D system well conditioned.
pub fn barycentric(p1: DVec3, p2: DVec3, p3: DVec3, p: DVec3) -> Barycentric {
    let e1 = p1 - p3;
    let e2 = p2 - p3;
    let pt = p - p3;
    let n = e1.cross(e2).abs();

    let (a1, a2) = if n.x >= n.y && n.x >= n.z {
        (1, 2)
    } else if n.y >= n.z {
        (0, 2)
    } else {
        (0, 1)
    };

    let u = (pt[a2] * e2[a1] - pt[a1] * e2[a2]) / (e1[a2] * e2[a1] - e1[a1] * e2[a2]);
    let v = (pt[a2] * e1[a1] - pt[a1] * e1[a2]) / (e2[a2] * e1[a1] - e2[a1] * e1[a2]);

    Barycentric {
        u,
        v,
        w: 1.0 - u - v,
        inside: u >= DIFF && v >= DIFF && u + v <= 1.0 + DIFF,
    }
}
