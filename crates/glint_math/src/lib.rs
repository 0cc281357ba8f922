// Re-export glam for convenience
pub use glam::*;

// glint math types
mod aabb;
mod camera;
mod ray;
mod transform;
mod vector;

pub use aabb::Aabb;
pub use camera::{unproject, Camera};
pub use ray::Ray;
pub use transform::{perspective_projection, view_matrix, MatrixExt};
pub use vector::{barycentric, limit_color, Barycentric, Color, VectorExt};

/// Epsilon used by the intersection kernels to reject self-hits and
/// near-parallel rays.
pub const DIFF: f64 = 1e-9;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dvec3_operations() {
        let a = DVec3::new(1.0, 2.0, 3.0);
        let b = DVec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, DVec3::new(5.0, 7.0, 9.0));
        assert_eq!(a[2], 3.0);
    }

    #[test]
    fn test_color_is_rgba() {
        let c: Color = Color::new(0.1, 0.2, 0.3, 1.0);
        assert_eq!(c.w, 1.0);
        assert_eq!(c.truncate(), DVec3::new(0.1, 0.2, 0.3));
    }
}
