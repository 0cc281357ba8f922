use crate::{perspective_projection, view_matrix, DMat4, DVec3, DVec4, MatrixExt};

/// Pinhole camera for the ray tracer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: DVec3,
    pub target: DVec3,
    pub up: DVec3,
    /// Vertical field of view in degrees
    pub fov: f64,
    pub aspect_ratio: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    /// Create a new camera
    pub fn new(position: DVec3, target: DVec3, aspect_ratio: f64) -> Self {
        Self {
            position,
            target,
            up: DVec3::Y,
            fov: 45.0,
            aspect_ratio,
            near: 0.1,
            far: 100.0,
        }
    }

    /// Get the view matrix (world → camera space)
    pub fn view_matrix(&self) -> DMat4 {
        view_matrix(self.position, self.target, self.up)
    }

    /// Get the projection matrix (camera → clip space)
    pub fn projection_matrix(&self) -> DMat4 {
        perspective_projection(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Inverse projection and inverse view, in that order.
    pub fn inverse_matrices(&self) -> (DMat4, DMat4) {
        (
            self.projection_matrix().invert_or_identity(),
            self.view_matrix().invert_or_identity(),
        )
    }
}

/// Map a normalized device coordinate to a world-space unit direction.
///
/// The far-plane clip point is taken to eye space, flattened to the
/// direction `(x, y, -1)` and rotated into world space by the inverse view.
pub fn unproject(inv_projection: &DMat4, inv_view: &DMat4, ndc_x: f64, ndc_y: f64) -> DVec3 {
    let eye = *inv_projection * DVec4::new(ndc_x, ndc_y, 1.0, 1.0);
    let eye = DVec4::new(eye.x, eye.y, -1.0, 0.0);
    let world = *inv_view * eye;
    world.truncate().normalize_or_zero()
}
