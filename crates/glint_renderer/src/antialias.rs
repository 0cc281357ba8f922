//! Adaptive antialiasing: resample only pixels on edges.

use glint_math::Color;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::camera::PixelProjector;
use crate::color::{average, rgb_sum};
use crate::config::MAX_ANTIALIAS_SAMPLES;
use crate::context::RenderContext;
use crate::renderer::PixelStorage;

/// Sub-pixel grid is `GRID x GRID` cells.
const GRID: usize = 8;

/// Whether the 3x3 block around (x, y) shows an edge.
///
/// Border pixels are never resampled. A block with a miss in it marks the
/// pixel as a silhouette; a block with fewer than three hits keeps its
/// color. Otherwise the spread of normalized depth or color sum has to
/// exceed `threshold`.
pub fn needs_resample(
    storage: &[PixelStorage],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    threshold: f64,
) -> bool {
    if x == 0 || y == 0 || x + 1 >= width || y + 1 >= height {
        return false;
    }

    let mut hits = 0;
    let mut transparent = false;
    let (mut min_depth, mut max_depth) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_sum, mut max_sum) = (f64::INFINITY, f64::NEG_INFINITY);

    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            let pixel = &storage[(ny * width + nx) as usize];
            if !pixel.world_location.hit() {
                transparent = true;
                continue;
            }
            hits += 1;
            min_depth = min_depth.min(pixel.depth);
            max_depth = max_depth.max(pixel.depth);
            let sum = rgb_sum(pixel.color);
            min_sum = min_sum.min(sum);
            max_sum = max_sum.max(sum);
        }
    }

    if hits < 3 {
        return false;
    }
    transparent || max_depth - min_depth > threshold || max_sum - min_sum > threshold
}

/// Average of `samples` jittered rays, each in a distinct cell of the
/// pixel's 8x8 sub-grid.
pub fn resample_pixel<R: Rng + ?Sized>(
    ctx: &RenderContext,
    projector: &PixelProjector,
    x: u32,
    y: u32,
    samples: usize,
    rng: &mut R,
) -> Color {
    let mut cells: Vec<usize> = (0..MAX_ANTIALIAS_SAMPLES).collect();
    cells.shuffle(rng);
    let count = samples.clamp(1, MAX_ANTIALIAS_SAMPLES);

    let cell_size = 1.0 / GRID as f64;
    let mut colors = Vec::with_capacity(count);
    for &cell in &cells[..count] {
        let sx = x as f64 + ((cell % GRID) as f64 + rng.gen::<f64>()) * cell_size;
        let sy = y as f64 + ((cell / GRID) as f64 + rng.gen::<f64>()) * cell_size;
        let hit = ctx.cast_ray(projector.origin(), projector.direction(sx, sy));
        colors.push(ctx.shade(&hit, 0));
    }
    average(colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::Intersection;
    use glint_math::DVec3;

    fn storage(width: u32, height: u32, f: impl Fn(u32, u32) -> Option<(f64, f64)>) -> Vec<PixelStorage> {
        let mut out = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let mut pixel = PixelStorage::default();
                if let Some((depth, brightness)) = f(x, y) {
                    pixel.world_location = Intersection {
                        triangle: Some(0),
                        dist: depth,
                        ..Intersection::miss(DVec3::ZERO, DVec3::NEG_Z)
                    };
                    pixel.depth = depth;
                    pixel.color = Color::new(brightness, brightness, brightness, 1.0);
                }
                out.push(pixel);
            }
        }
        out
    }

    #[test]
    fn test_flat_region_is_kept() {
        let s = storage(5, 5, |_, _| Some((0.5, 0.3)));
        for y in 0..5 {
            for x in 0..5 {
                assert!(!needs_resample(&s, 5, 5, x, y, 0.2));
            }
        }
    }

    #[test]
    fn test_depth_edge() {
        let s = storage(5, 5, |x, _| Some((if x < 2 { 0.2 } else { 0.9 }, 0.3)));
        assert!(needs_resample(&s, 5, 5, 2, 2, 0.2));
        assert!(!needs_resample(&s, 5, 5, 3, 2, 0.2));
    }

    #[test]
    fn test_color_edge() {
        let s = storage(5, 5, |_, y| Some((0.5, if y < 2 { 0.0 } else { 0.5 })));
        assert!(needs_resample(&s, 5, 5, 2, 2, 0.2));
    }

    #[test]
    fn test_silhouette_and_sparse_blocks() {
        // One miss next to hits: silhouette
        let s = storage(5, 5, |x, y| if (x, y) == (1, 1) { None } else { Some((0.5, 0.3)) });
        assert!(needs_resample(&s, 5, 5, 2, 2, 0.2));

        // Mostly background: fewer than three hits
        let s = storage(5, 5, |x, y| if (x, y) == (2, 2) { Some((0.5, 0.3)) } else { None });
        assert!(!needs_resample(&s, 5, 5, 2, 2, 0.2));
    }

    #[test]
    fn test_border_is_never_resampled() {
        let s = storage(5, 5, |x, _| Some((x as f64 * 0.3, 0.3)));
        assert!(!needs_resample(&s, 5, 5, 0, 2, 0.2));
        assert!(!needs_resample(&s, 5, 5, 4, 2, 0.2));
    }
}
