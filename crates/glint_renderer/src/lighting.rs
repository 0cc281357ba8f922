//! Direct lighting: shadow rays, light falloff, light through glass and
//! caustic lookups.
//!
//! Light values are colors whose RGB carries energy; their alpha is 0.

use glint_core::Light;
use glint_math::{Color, VectorExt, DIFF};

use crate::color::mul_rgb;
use crate::context::RenderContext;
use crate::raycast::Intersection;
use crate::sampling::sample_sphere;

/// Tolerance when comparing a shadow ray's length to the light distance.
const SHADOW_EPSILON: f64 = 1e-6;

/// Radius of the ball directional-light shadow rays start from.
const DIRECTIONAL_SPREAD: f64 = 0.5;

fn energy(color: Color, strength: f64) -> Color {
    Color::new(color.x * strength, color.y * strength, color.z * strength, 0.0)
}

impl RenderContext {
    /// Light from every source arriving at a hit, plus nearby caustics.
    pub fn direct_light(&self, hit: &Intersection, depth: usize) -> Color {
        let mut total = Color::ZERO;
        for light in self.lights.iter().filter(|l| l.color.w > 0.0) {
            total += if light.directional {
                self.directional_light(hit, light, depth)
            } else {
                self.point_light(hit, light, depth)
            };
        }
        total + self.caustics_at(hit)
    }

    /// Inverse-square falloff, cosine weighted, scaled by exposure.
    ///
    /// The shadow ray runs from the light toward the hit point.
    pub fn point_light(&self, hit: &Intersection, light: &Light, depth: usize) -> Color {
        let to_light = light.position - hit.point;
        let expected = to_light.length();
        if expected < DIFF {
            return Color::ZERO;
        }
        let direction = to_light / expected;
        let facing = hit.normal.dot(direction);
        if facing <= 0.0 {
            return Color::ZERO;
        }

        let shadow = self.cast_ray(light.position, -direction);
        let base = light.strength * self.config.exposure * facing;

        if self.reaches(hit, &shadow, expected) {
            return energy(light.color, base / (expected * expected));
        }
        if !shadow.hit() {
            return Color::ZERO;
        }
        self.through_glass(hit, light, &shadow, base / (shadow.dist * shadow.dist), depth)
    }

    /// Cosine weighted and scaled by exposure, no falloff.
    ///
    /// Shadow rays start beyond the scene bounds, jittered inside a small
    /// ball, and the result is the mean over `light_sample_count` rays.
    pub fn directional_light(&self, hit: &Intersection, light: &Light, depth: usize) -> Color {
        let to_light = -light.direction.normalize_or_self();
        let facing = hit.normal.dot(to_light);
        if facing <= 0.0 {
            return Color::ZERO;
        }

        let strength = light.strength * self.config.exposure * facing;
        let far = self.scene_extent * 2.0 + 1.0;
        let offsets = sample_sphere(DIRECTIONAL_SPREAD, self.config.light_sample_count.max(1));
        let count = offsets.len() as f64;

        let mut total = Color::ZERO;
        for offset in offsets {
            let start = hit.point + to_light * far + offset;
            let path = hit.point - start;
            let expected = path.length();
            let shadow = self.cast_ray(start, path / expected);

            total += if !shadow.hit() || self.reaches(hit, &shadow, expected) {
                energy(light.color, strength)
            } else {
                self.through_glass(hit, light, &shadow, strength, depth)
            };
        }
        total / count
    }

    /// Whether a shadow ray cast toward `hit` ended on it: the same
    /// triangle, or a surface at the expected distance, lit on the same
    /// side.
    fn reaches(&self, hit: &Intersection, shadow: &Intersection, expected: f64) -> bool {
        if !shadow.hit() {
            return false;
        }
        let same_surface = shadow.triangle == hit.triangle
            || (shadow.dist + self.config.ray_correction - expected).abs() < SHADOW_EPSILON;
        same_surface && shadow.normal.same_side(hit.normal, 0.0)
    }

    /// Light blocked by a flat transmissive surface continues from the
    /// blocking point as a tinted, weakened point light.
    fn through_glass(
        &self,
        hit: &Intersection,
        light: &Light,
        shadow: &Intersection,
        strength_at_glass: f64,
        depth: usize,
    ) -> Color {
        let Some(occluder) = self.triangle_of(shadow) else {
            return Color::ZERO;
        };
        let material = &occluder.material;
        if !material.is_transmissive() || occluder.smooth {
            return Color::ZERO;
        }
        if depth + 1 >= self.config.max_reflection_depth {
            return Color::ZERO;
        }

        let tint = self.surface_color(occluder, shadow.point);
        let sublight = Light::point(
            shadow.point,
            mul_rgb(light.color, tint),
            strength_at_glass * material.transmission,
        );
        self.point_light(hit, &sublight, depth + 1)
    }

    /// Photon deposits on the hit triangle within `photon_spacing`.
    pub fn caustics_at(&self, hit: &Intersection) -> Color {
        let Some(triangle) = hit.triangle else {
            return Color::ZERO;
        };
        self.photons
            .deposits(triangle)
            .iter()
            .filter(|p| p.location.distance(hit.point) < self.config.photon_spacing)
            .fold(Color::ZERO, |acc, p| acc + energy(p.color, self.config.exposure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use glint_math::DVec3;
    use crate::context::tests::{context, quad, small_config};
    use glint_core::{Material, Triangle};
    use std::sync::Arc;

    fn floor_hit(ctx: &RenderContext) -> Intersection {
        ctx.cast_ray(DVec3::new(0.1, 0.2, 5.0), DVec3::NEG_Z)
    }

    fn exposure_one() -> RenderConfig {
        RenderConfig {
            exposure: 1.0,
            ..small_config()
        }
    }

    #[test]
    fn test_point_light_inverse_square() {
        let floor = quad(0.0, 5.0, Arc::new(Material::default()));
        let light = Light::point(DVec3::new(0.1, 0.2, 2.0), Color::ONE, 8.0);
        let ctx = context(floor, vec![light], exposure_one());

        let hit = floor_hit(&ctx);
        let lit = ctx.point_light(&hit, &ctx.lights()[0], 0);
        // Straight above at distance 2, facing 1
        assert!((lit.x - 2.0).abs() < 1e-6);
        assert!((lit.y - 2.0).abs() < 1e-6);
        assert_eq!(lit.w, 0.0);
    }

    #[test]
    fn test_light_behind_surface_is_dark() {
        let floor = quad(0.0, 5.0, Arc::new(Material::default()));
        let light = Light::point(DVec3::new(0.0, 0.0, -2.0), Color::ONE, 8.0);
        let ctx = context(floor, vec![light], exposure_one());

        let hit = floor_hit(&ctx);
        assert_eq!(ctx.direct_light(&hit, 0), Color::ZERO);
    }

    #[test]
    fn test_opaque_blocker_casts_shadow() {
        let mut triangles = quad(0.0, 5.0, Arc::new(Material::default()));
        triangles.extend(quad(1.0, 1.0, Arc::new(Material::default())));
        let light = Light::point(DVec3::new(0.1, 0.2, 2.0), Color::ONE, 8.0);
        let ctx = context(triangles, vec![light], exposure_one());

        let hit = ctx.cast_ray(DVec3::new(0.1, 0.2, 0.5), DVec3::NEG_Z);
        assert!(hit.hit());
        assert_eq!(ctx.direct_light(&hit, 0), Color::ZERO);
    }

    #[test]
    fn test_glass_passes_tinted_light() {
        let mut triangles = quad(0.0, 5.0, Arc::new(Material::default()));
        let glass = Material::glass(Color::new(1.0, 0.5, 0.0, 1.0), 0.5, 1.0);
        triangles.extend(quad(1.0, 1.0, Arc::new(glass)));
        let light = Light::point(DVec3::new(0.1, 0.2, 2.0), Color::ONE, 8.0);
        let ctx = context(triangles, vec![light], exposure_one());

        let hit = ctx.cast_ray(DVec3::new(0.1, 0.2, 0.5), DVec3::NEG_Z);
        let lit = ctx.direct_light(&hit, 0);
        assert!(lit.x > 0.0);
        assert!((lit.y - lit.x * 0.5).abs() < 1e-9);
        assert_eq!(lit.z, 0.0);

        // No depth left for the pass-through
        let limit = ctx.config().max_reflection_depth;
        assert_eq!(ctx.direct_light(&hit, limit - 1), Color::ZERO);
    }

    #[test]
    fn test_directional_light_is_cosine_weighted() {
        let floor = quad(0.0, 5.0, Arc::new(Material::default()));
        let slanted = DVec3::new(0.0, -1.0, -1.0).normalize();
        let light = Light::directional(slanted, Color::ONE, 2.0);
        let config = RenderConfig {
            light_sample_count: 4,
            ..exposure_one()
        };
        let ctx = context(floor, vec![light], config);

        let hit = floor_hit(&ctx);
        let lit = ctx.direct_light(&hit, 0);
        let expected = 2.0 * std::f64::consts::FRAC_1_SQRT_2;
        assert!((lit.x - expected).abs() < 1e-6);
    }

    #[test]
    fn test_directional_light_blocked() {
        let mut triangles = quad(0.0, 5.0, Arc::new(Material::default()));
        triangles.extend(quad(1.0, 3.0, Arc::new(Material::default())));
        let light = Light::directional(DVec3::NEG_Z, Color::ONE, 2.0);
        let ctx = context(triangles, vec![light], exposure_one());

        let hit = ctx.cast_ray(DVec3::new(0.1, 0.2, 0.5), DVec3::NEG_Z);
        assert_eq!(ctx.direct_light(&hit, 0), Color::ZERO);
    }

    #[test]
    fn test_lights_with_zero_alpha_are_ignored() {
        let floor = quad(0.0, 5.0, Arc::new(Material::default()));
        let light = Light::point(DVec3::new(0.0, 0.0, 2.0), Color::new(1.0, 1.0, 1.0, 0.0), 8.0);
        let ctx = context(floor, vec![light], exposure_one());
        assert_eq!(ctx.direct_light(&floor_hit(&ctx), 0), Color::ZERO);
    }

    #[test]
    fn test_smooth_glass_blocks() {
        let mut triangles = quad(0.0, 5.0, Arc::new(Material::default()));
        let glass = Arc::new(Material::glass(Color::ONE, 0.9, 1.0));
        triangles.extend(
            quad(1.0, 1.0, glass)
                .into_iter()
                .map(|t: Triangle| t.with_smooth_normals([DVec3::Z; 3])),
        );
        let light = Light::point(DVec3::new(0.1, 0.2, 2.0), Color::ONE, 8.0);
        let ctx = context(triangles, vec![light], exposure_one());

        let hit = ctx.cast_ray(DVec3::new(0.1, 0.2, 0.5), DVec3::NEG_Z);
        assert_eq!(ctx.direct_light(&hit, 0), Color::ZERO);
    }
}
