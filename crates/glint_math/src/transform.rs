// Transform utilities for DMat4
//
// Scene matrices, view and projection. glam already provides
// transform_point3/transform_vector3 and inverse(); this adds the
// degenerate-inverse policy and the camera matrix constructors.

use crate::{DMat4, DVec3};

/// Determinants below this magnitude are treated as singular.
const SINGULAR_DETERMINANT: f64 = 1e-40;

/// Extension trait for DMat4 with the inversion rules the tracer relies on.
pub trait MatrixExt {
    /// Inverse via adjugate/determinant, or the identity matrix when the
    /// matrix is (nearly) singular.
    fn invert_or_identity(&self) -> DMat4;

    /// Transform a surface normal: inverse transpose, renormalized.
    /// Degenerate results come back unnormalized rather than NaN.
    fn transform_normal(&self, normal: DVec3) -> DVec3;
}

impl MatrixExt for DMat4 {
    fn invert_or_identity(&self) -> DMat4 {
        let det = self.determinant();
        if det.abs() < SINGULAR_DETERMINANT {
            return DMat4::IDENTITY;
        }
        self.inverse()
    }

    fn transform_normal(&self, normal: DVec3) -> DVec3 {
        let n = self.invert_or_identity().transpose().transform_vector3(normal);
        n.try_normalize().unwrap_or(n)
    }
}

/// Perspective projection with the field of view in degrees and GL clip
/// conventions (`z` in [-1, 1], camera looking down -Z).
pub fn perspective_projection(fovy_degrees: f64, aspect: f64, near: f64, far: f64) -> DMat4 {
    DMat4::perspective_rh_gl(fovy_degrees.to_radians(), aspect, near, far)
}

/// World to camera matrix for an eye looking at `target`.
pub fn view_matrix(eye: DVec3, target: DVec3, up: DVec3) -> DMat4 {
    DMat4::look_at_rh(eye, target, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_translation() {
        let mat = DMat4::from_translation(DVec3::new(10.0, 20.0, 30.0));
        let inv = mat.invert_or_identity();

        let point = DVec3::new(1.0, 2.0, 3.0);
        let back = inv.transform_point3(mat.transform_point3(point));

        assert!((back - point).length() < 1e-9);
    }

    #[test]
    fn test_singular_inverts_to_identity() {
        let mat = DMat4::from_scale(DVec3::new(1.0, 0.0, 1.0));
        assert_eq!(mat.invert_or_identity(), DMat4::IDENTITY);

        let tiny = DMat4::from_scale(DVec3::splat(1e-14));
        assert_eq!(tiny.invert_or_identity(), DMat4::IDENTITY);
    }

    #[test]
    fn test_transform_normal_non_uniform_scale() {
        // Squash Y: a 45 degree slope normal must tilt towards Y
        let mat = DMat4::from_scale(DVec3::new(1.0, 0.5, 1.0));
        let n = DVec3::new(1.0, 1.0, 0.0).normalize();
        let t = mat.transform_normal(n);

        assert!((t.length() - 1.0).abs() < 1e-9);
        assert!(t.y > t.x);
    }

    #[test]
    fn test_transform_vector3_ignores_translation() {
        let mat = DMat4::from_translation(DVec3::new(10.0, 20.0, 30.0));
        assert_eq!(mat.transform_vector3(DVec3::X), DVec3::X);
    }

    #[test]
    fn test_projection_maps_near_plane() {
        let proj = perspective_projection(90.0, 1.0, 1.0, 100.0);
        let clip = proj * crate::DVec4::new(0.0, 0.0, -1.0, 1.0);
        assert!((clip.z / clip.w + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let view = view_matrix(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Y);
        let eye = view.transform_point3(DVec3::new(0.0, 0.0, 5.0));
        assert!(eye.length() < 1e-9);
    }
}
