//! What a ray sees when it leaves the scene.

use std::f64::consts::PI;

use glint_core::Texture;
use glint_math::{Color, DVec3};

/// Radiance arriving from outside the scene along a direction.
pub trait Environment: Send + Sync {
    fn radiance(&self, direction: DVec3) -> Color;
}

/// A single color in every direction (usually transparent black).
#[derive(Debug, Clone, Copy)]
pub struct SolidBackground {
    pub color: Color,
}

impl SolidBackground {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Environment for SolidBackground {
    fn radiance(&self, _direction: DVec3) -> Color {
        self.color
    }
}

/// Equirectangular image wrapped around the scene, Z up.
///
/// Longitude comes from `atan2(x, y)`, latitude linearly from `z`.
pub struct EnvironmentMap {
    texture: Texture,
}

impl EnvironmentMap {
    pub fn new(texture: Texture) -> Self {
        Self { texture }
    }

    fn texel_for(&self, direction: DVec3) -> (u32, u32) {
        let d = direction.normalize_or_zero();
        let u = d.x.atan2(d.y) / (2.0 * PI) + 0.5;
        let v = d.z * 0.5 + 0.5;

        let max_x = self.texture.width.saturating_sub(1) as f64;
        let max_y = self.texture.height.saturating_sub(1) as f64;
        let x = (max_x * u).clamp(0.0, max_x) as u32;
        let y = (max_y - max_y * v).clamp(0.0, max_y) as u32;
        (x, y)
    }
}

impl Environment for EnvironmentMap {
    fn radiance(&self, direction: DVec3) -> Color {
        let (x, y) = self.texel_for(direction);
        self.texture.texel(x, y)
    }
}
