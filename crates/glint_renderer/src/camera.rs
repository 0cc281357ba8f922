//! Primary ray generation.

use glint_math::{unproject, Camera, DMat4, DVec3};

/// Maps raster positions to world-space ray directions for one camera and
/// resolution. The inverse matrices are computed once.
#[derive(Debug, Clone, Copy)]
pub struct PixelProjector {
    origin: DVec3,
    inv_projection: DMat4,
    inv_view: DMat4,
    width: f64,
    height: f64,
}

impl PixelProjector {
    /// A camera without a usable aspect ratio takes the raster's.
    pub fn new(camera: &Camera, width: u32, height: u32) -> Self {
        let mut camera = *camera;
        if camera.aspect_ratio <= 0.0 || !camera.aspect_ratio.is_finite() {
            camera.aspect_ratio = width as f64 / height as f64;
        }
        let (inv_projection, inv_view) = camera.inverse_matrices();

        Self {
            origin: camera.position,
            inv_projection,
            inv_view,
            width: width as f64,
            height: height as f64,
        }
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Direction through a continuous raster position; (0, 0) is the
    /// top-left corner of the image.
    pub fn direction(&self, x: f64, y: f64) -> DVec3 {
        let ndc_x = 2.0 * x / self.width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / self.height;
        unproject(&self.inv_projection, &self.inv_view, ndc_x, ndc_y)
    }

    /// Direction through the center of a pixel.
    pub fn pixel_direction(&self, px: u32, py: u32) -> DVec3 {
        self.direction(px as f64 + 0.5, py as f64 + 0.5)
    }
}
