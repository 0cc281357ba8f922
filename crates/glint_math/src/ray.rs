use crate::DVec3;

/// A ray in 3D space with origin and direction.
///
/// Directions are expected to be unit length wherever distances are read
/// back from the parametric `t`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// The same ray with its origin pushed `correction` units along the
    /// direction, so it does not immediately re-hit the surface it leaves.
    #[inline]
    pub fn nudged(&self, correction: f64) -> Self {
        Self {
            origin: self.at(correction),
            direction: self.direction,
        }
    }
}
