use crate::DVec3;

/// Axis-Aligned Bounding Box for the KD-tree.
///
/// Stored as a min/max corner pair. Flat boxes (zero extent on one axis)
/// are legal: axis-aligned triangles produce them and the ray test below
/// handles them without padding.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

/// Position of a ray origin relative to one slab of the box.
#[derive(Debug, Copy, Clone, PartialEq)]
enum Quadrant {
    Left,
    Right,
    Middle,
}

/// Per-axis part of the candidate-plane test: which side of the slab the
/// origin lies on and the parametric distance to the candidate plane
/// (-1 when the origin is inside the slab or the ray runs parallel to it).
#[inline]
fn candidate_plane(origin: f64, direction: f64, min: f64, max: f64) -> (Quadrant, f64) {
    let (quadrant, plane) = if origin < min {
        (Quadrant::Left, min)
    } else if origin > max {
        (Quadrant::Right, max)
    } else {
        return (Quadrant::Middle, -1.0);
    };

    if direction != 0.0 {
        (quadrant, (plane - origin) / direction)
    } else {
        (quadrant, -1.0)
    }
}

impl Aabb {
    /// An inverted box that any `surrounding`/`extend_point` call replaces.
    pub const EMPTY: Aabb = Aabb {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create an AABB from two corner points (in any order).
    pub fn from_points(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Grow the box to include a point.
    pub fn extend_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Size of the box along each axis.
    pub fn extent(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let size = self.extent();

        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// Test whether a ray hits this box.
    ///
    /// Candidate-plane method: an origin inside the box is always a hit.
    /// Otherwise the farthest of the per-axis candidate planes is the only
    /// one the ray can enter through, so a single bounds check on the two
    /// remaining axes decides the test. There is no upper limit on `t`.
    pub fn hit(&self, origin: DVec3, direction: DVec3) -> bool {
        let (qx, tx) = candidate_plane(origin.x, direction.x, self.min.x, self.max.x);
        let (qy, ty) = candidate_plane(origin.y, direction.y, self.min.y, self.max.y);
        let (qz, tz) = candidate_plane(origin.z, direction.z, self.min.z, self.max.z);

        if qx == Quadrant::Middle && qy == Quadrant::Middle && qz == Quadrant::Middle {
            return true;
        }

        // Largest candidate distance picks the entry plane
        let (plane, t) = if tx >= ty && tx >= tz {
            (0, tx)
        } else if ty >= tz {
            (1, ty)
        } else {
            (2, tz)
        };

        if t < 0.0 {
            return false;
        }

        if plane != 0 {
            let x = origin.x + t * direction.x;
            if x < self.min.x || x > self.max.x {
                return false;
            }
        }
        if plane != 1 {
            let y = origin.y + t * direction.y;
            if y < self.min.y || y > self.max.y {
                return false;
            }
        }
        if plane != 2 {
            let z = origin.z + t * direction.z;
            if z < self.min.z || z > self.max.z {
                return false;
            }
        }

        true
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
