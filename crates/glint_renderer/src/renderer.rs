//! Image assembly: intersections, shading, depth and adaptive antialiasing.
//!
//! Every pass is a scatter/gather over image buckets on the context's
//! worker pool.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use glint_math::{limit_color, Camera, Color};

use crate::antialias::{needs_resample, resample_pixel};
use crate::bucket::render_buckets;
use crate::camera::PixelProjector;
use crate::context::RenderContext;
use crate::error::RenderResult;
use crate::raycast::Intersection;

/// Per-pixel results of the shading pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelStorage {
    pub world_location: Intersection,
    pub direct_light: Color,
    pub ambient_rate: f64,
    pub base_color: Color,
    pub ambient_color: Color,
    pub light: Color,
    /// Hit distance, normalized to [0, 1] after the shading pass
    pub depth: f64,
    pub color: Color,
}

/// Final image: RGBA in [0, 1] plus normalized depth, both row-major.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
    pub depth: Vec<f64>,
}

impl RenderOutput {
    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Convert to RGBA bytes (for saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            let c = limit_color(*color);
            bytes.extend_from_slice(&[to_byte(c.x), to_byte(c.y), to_byte(c.z), to_byte(c.w)]);
        }
        bytes
    }

    /// Depth as 8-bit grayscale, near is dark.
    pub fn depth_to_luma8(&self) -> Vec<u8> {
        self.depth.iter().map(|&d| to_byte(d)).collect()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        image::save_buffer(
            path.as_ref(),
            &self.to_rgba8(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )?;
        Ok(())
    }

    pub fn save_depth_png(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        image::save_buffer(
            path.as_ref(),
            &self.depth_to_luma8(),
            self.width,
            self.height,
            image::ColorType::L8,
        )?;
        Ok(())
    }
}

#[inline]
fn to_byte(v: f64) -> u8 {
    let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    (v * 255.0).round() as u8
}

/// Depth relative to the farthest hit; misses and degenerate scenes give 0.
fn normalize_depth(depth: f64, max_depth: f64) -> f64 {
    let d = depth / max_depth;
    if d.is_finite() {
        d
    } else {
        0.0
    }
}

/// Renders a `RenderContext` from one camera.
pub struct Renderer<'a> {
    ctx: &'a RenderContext,
    projector: PixelProjector,
}

impl<'a> Renderer<'a> {
    pub fn new(ctx: &'a RenderContext, camera: &Camera) -> Self {
        let projector = PixelProjector::new(camera, ctx.config.width, ctx.config.height);
        Self { ctx, projector }
    }

    /// Run all passes and return the finished image.
    pub fn render(&self) -> RenderOutput {
        let ctx = self.ctx;
        let (width, height) = (ctx.config.width, ctx.config.height);
        let start = Instant::now();

        let origin = self.projector.origin();
        let intersections: Vec<Intersection> = render_buckets(&ctx.pool, width, height, |x, y| {
            ctx.cast_ray(origin, self.projector.pixel_direction(x, y))
        });
        log::info!("Intersections: {:.2?}", start.elapsed());

        let pass = Instant::now();
        let mut storage: Vec<PixelStorage> = render_buckets(&ctx.pool, width, height, |x, y| {
            let hit = intersections[(y * width + x) as usize];
            let shading = ctx.shade_detailed(&hit, 0);
            PixelStorage {
                world_location: hit,
                direct_light: shading.direct_light,
                ambient_rate: shading.ambient_rate,
                base_color: shading.base_color,
                ambient_color: shading.ambient_color,
                light: shading.light,
                depth: if hit.hit() { hit.dist } else { 0.0 },
                color: shading.color,
            }
        });

        let max_depth = storage.iter().map(|p| p.depth).fold(0.0, f64::max);
        for pixel in &mut storage {
            pixel.depth = normalize_depth(pixel.depth, max_depth);
        }
        log::info!("Shading: {:.2?}", pass.elapsed());

        let pass = Instant::now();
        let samples = ctx.config.antialias_samples();
        let threshold = ctx.config.edge_detect_threshold;
        let resampled = AtomicUsize::new(0);
        let pixels: Vec<Color> = render_buckets(&ctx.pool, width, height, |x, y| {
            let stored = storage[(y * width + x) as usize].color;
            if samples == 0 || !needs_resample(&storage, width, height, x, y, threshold) {
                return limit_color(stored);
            }
            resampled.fetch_add(1, Ordering::Relaxed);
            let mut rng = rand::thread_rng();
            limit_color(resample_pixel(ctx, &self.projector, x, y, samples, &mut rng))
        });
        log::info!(
            "Antialiasing: {} pixels resampled in {:.2?}",
            resampled.load(Ordering::Relaxed),
            pass.elapsed()
        );

        log::info!(
            "Rendered {}x{} in {:.2?} ({} rays, deepest bounce {})",
            width,
            height,
            start.elapsed(),
            ctx.stats.rays(),
            ctx.stats.deepest_bounce()
        );

        RenderOutput {
            width,
            height,
            depth: storage.iter().map(|p| p.depth).collect(),
            pixels,
        }
    }
}
