//! Photon map for caustics.
//!
//! Photons are shot from every point light toward sample points on glossy
//! and transmissive triangles, bounced through them, and deposited on the
//! first diffuse surface they reach. Deposits live in a side table keyed by
//! triangle index.

use std::collections::HashMap;

use glint_math::{Color, DVec3, VectorExt, DIFF};
use rayon::prelude::*;

use crate::color::{mul_rgb, scale_rgb};
use crate::context::RenderContext;
use crate::sampling::sample_triangle;

/// Photon batches per worker thread, per light.
const BATCHES_PER_THREAD: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photon {
    pub location: DVec3,
    pub direction: DVec3,
    pub color: Color,
    pub intensity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PhotonMap {
    deposits: HashMap<usize, Vec<Photon>>,
}

impl PhotonMap {
    /// Photons deposited on a triangle.
    pub fn deposits(&self, triangle: usize) -> &[Photon] {
        self.deposits
            .get(&triangle)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of deposits.
    pub fn len(&self) -> usize {
        self.deposits.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.values().all(Vec::is_empty)
    }

    pub fn merge(&mut self, batch: impl IntoIterator<Item = (usize, Photon)>) {
        for (triangle, photon) in batch {
            self.deposits.entry(triangle).or_default().push(photon);
        }
    }

    /// Trace photons from every point light on the context's pool.
    ///
    /// Each light's targets are split into `threads * 8` batches traced in
    /// parallel; their deposits are merged once all batches of that light
    /// have finished.
    pub fn build(ctx: &RenderContext) -> Self {
        let targets: Vec<DVec3> = ctx
            .triangles
            .iter()
            .filter(|t| t.material.is_glossy() || t.material.is_transmissive())
            .flat_map(|t| sample_triangle(t, ctx.config.caustics_samples))
            .collect();

        let mut map = Self::default();
        if targets.is_empty() {
            return map;
        }

        let batches = ctx.pool.current_num_threads().max(1) * BATCHES_PER_THREAD;
        let batch_size = targets.len().div_ceil(batches).max(1);

        for light in ctx.lights.iter().filter(|l| !l.directional) {
            let deposits: Vec<Vec<(usize, Photon)>> = ctx.pool.install(|| {
                targets
                    .par_chunks(batch_size)
                    .map(|batch| {
                        let mut out = Vec::new();
                        for &target in batch {
                            let photon = Photon {
                                location: light.position,
                                direction: (target - light.position).normalize_or_self(),
                                color: light.color,
                                intensity: light.strength,
                            };
                            ctx.trace_photon(photon, 0, &mut out);
                        }
                        out
                    })
                    .collect()
            });

            for batch in deposits {
                map.merge(batch);
            }
        }

        log::debug!(
            "Traced {} photon targets per light over {} lights",
            targets.len(),
            ctx.lights.iter().filter(|l| !l.directional).count()
        );
        map
    }
}

impl RenderContext {
    /// Follow one photon, pushing any deposit to `out`.
    pub fn trace_photon(&self, photon: Photon, depth: usize, out: &mut Vec<(usize, Photon)>) {
        if photon.intensity < DIFF || depth >= self.config.max_reflection_depth {
            return;
        }

        let hit = self.cast_ray(photon.location, photon.direction);
        let Some(triangle) = self.triangle_of(&hit) else {
            return;
        };

        let facing = hit.normal.dot(-photon.direction);
        if facing < 0.0 {
            return;
        }
        let dist_sq = hit.point.distance_squared(photon.location).max(DIFF);
        let intensity = photon.intensity * facing / dist_sq;
        let material = &triangle.material;

        if material.is_diffuse() {
            out.push((
                triangle.id,
                Photon {
                    location: hit.point,
                    direction: photon.direction,
                    color: scale_rgb(photon.color, intensity),
                    intensity,
                },
            ));
            return;
        }

        if material.is_glossy() {
            let reflected = Photon {
                location: hit.point,
                direction: photon.direction.reflect(hit.normal),
                color: photon.color,
                intensity: intensity * material.glossiness,
            };
            self.trace_photon(reflected, depth + 1, out);
        }

        if material.is_transmissive() {
            let outward = if hit.front_face { hit.normal } else { -hit.normal };
            let mut direction = photon
                .direction
                .refract_ior(outward, material.index_of_refraction);
            if direction == DVec3::ZERO {
                direction = photon.direction.reflect(hit.normal);
            }
            let tint = self.surface_color(triangle, hit.point);
            let refracted = Photon {
                location: hit.point,
                direction: direction.normalize_or_self(),
                color: mul_rgb(photon.color, tint),
                intensity: intensity * material.transmission,
            };
            self.trace_photon(refracted, depth + 1, out);
        }
    }
}
