//! Recursive light transport for a single intersection.

use glint_math::{limit_color, Color, DVec3, VectorExt};

use crate::ambient::AmbientSamples;
use crate::color::average;
use crate::context::RenderContext;
use crate::raycast::Intersection;
use crate::sampling::jittered_normals;

/// Intermediate values of a shading call, kept per pixel by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Shading {
    pub direct_light: Color,
    pub ambient_rate: f64,
    pub base_color: Color,
    pub ambient_color: Color,
    /// Direct plus ambient light the base color was multiplied by
    pub light: Color,
    pub color: Color,
}

impl Shading {
    fn flat(color: Color) -> Self {
        Self {
            base_color: color,
            color,
            ..Default::default()
        }
    }
}

impl RenderContext {
    pub fn shade(&self, hit: &Intersection, depth: usize) -> Color {
        self.shade_detailed(hit, depth).color
    }

    /// Shade an intersection at recursion level `depth`.
    ///
    /// Misses take the environment, surfaces at the depth limit their base
    /// color and emitters their own color. Everything else gets direct
    /// light, ambient occlusion and color bleeding, then reflection and
    /// refraction blends, clamping after each stage.
    pub fn shade_detailed(&self, hit: &Intersection, depth: usize) -> Shading {
        self.stats.record_depth(depth);

        let Some(triangle) = self.triangle_of(hit) else {
            return Shading::flat(self.background(hit.ray_dir));
        };
        let material = &triangle.material;
        let base = self.surface_color(triangle, hit.point);

        if depth >= self.config.max_reflection_depth {
            return Shading::flat(base);
        }
        if material.is_emissive() {
            return Shading::flat(limit_color(Color::new(base.x, base.y, base.z, 1.0)));
        }

        let samples = if self.config.render_occlusion || self.config.render_ambient_colors {
            self.ambient_samples(hit)
        } else {
            AmbientSamples::default()
        };

        let direct_light = if self.config.render_lights {
            self.direct_light(hit, depth)
        } else {
            Color::ZERO
        };
        let mut light = direct_light;

        let mut ambient_rate = 0.0;
        if self.config.render_occlusion {
            let mut occlusion = self.ambient_occlusion(&samples);
            if material.is_glossy() {
                let g = material.glossiness;
                occlusion = occlusion * (1.0 - g) + self.reflected_occlusion(hit) * g;
            }
            ambient_rate = occlusion * self.config.occlusion_rate;
            light += Color::new(ambient_rate, ambient_rate, ambient_rate, 0.0);
        }

        let mut color = base;
        let mut ambient_color = Color::ZERO;
        if self.config.render_ambient_colors {
            if let Some(bled) = self.ambient_color(&samples) {
                let ratio = self.config.ambient_color_ratio;
                ambient_color = bled;
                color = limit_color(color * (1.0 - ratio) + bled * ratio);
            }
        }

        color = limit_color(Color::new(
            color.x * light.x,
            color.y * light.y,
            color.z * light.z,
            1.0,
        ));

        if self.config.render_reflections && material.is_glossy() {
            let g = material.glossiness;
            let reflected = average(
                jittered_normals(hit.normal, material.roughness)
                    .into_iter()
                    .map(|normal| self.trace(hit.point, hit.ray_dir.reflect(normal), depth)),
            );
            color = limit_color(color * (1.0 - g) + reflected * g);
        }

        if self.config.render_refractions && material.is_transmissive() {
            let t = material.transmission * (1.0 - material.roughness);
            let outward = if hit.front_face { hit.normal } else { -hit.normal };
            let refracted = average(
                jittered_normals(outward, material.roughness)
                    .into_iter()
                    .map(|normal| {
                        let mut direction =
                            hit.ray_dir.refract_ior(normal, material.index_of_refraction);
                        if direction == DVec3::ZERO {
                            // Total internal reflection
                            direction = hit.ray_dir.reflect(normal);
                        }
                        self.trace(hit.point, direction.normalize_or_self(), depth)
                    }),
            );
            color = limit_color(color * (1.0 - t) + refracted * t);
        }

        Shading {
            direct_light,
            ambient_rate,
            base_color: base,
            ambient_color,
            light,
            color,
        }
    }

    /// Cast and shade one level deeper.
    fn trace(&self, origin: DVec3, direction: DVec3, depth: usize) -> Color {
        let next = self.cast_ray(origin, direction);
        self.shade(&next, depth + 1)
    }

    /// Occlusion at the mirror target; open sky counts as unoccluded.
    fn reflected_occlusion(&self, hit: &Intersection) -> f64 {
        let target = self.cast_ray(hit.point, hit.ray_dir.reflect(hit.normal));
        if target.hit() {
            self.ambient_occlusion(&self.ambient_samples(&target))
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::context::tests::{context, quad, small_config};
    use glint_core::{Light, Material};
    use std::sync::Arc;

    fn down(ctx: &RenderContext) -> Intersection {
        ctx.cast_ray(DVec3::new(0.1, 0.2, 3.0), DVec3::NEG_Z)
    }

    #[test]
    fn test_miss_returns_background() {
        let config = RenderConfig {
            transparent_color: [0.1, 0.2, 0.3, 0.4],
            ..small_config()
        };
        let ctx = context(Vec::new(), Vec::new(), config);
        let miss = ctx.cast_ray(DVec3::ZERO, DVec3::Z);
        assert_eq!(ctx.shade(&miss, 0), Color::new(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn test_emissive_returns_own_color() {
        let lamp = Arc::new(Material::emissive(Color::new(0.9, 0.7, 0.5, 1.0), 3.0));
        let ctx = context(quad(0.0, 1.0, lamp), Vec::new(), small_config());
        let hit = down(&ctx);
        assert_eq!(ctx.shade(&hit, 0), Color::new(0.9, 0.7, 0.5, 1.0));
    }

    #[test]
    fn test_depth_limit_returns_base() {
        let material = Arc::new(Material::glossy(Color::new(0.3, 0.6, 0.9, 1.0), 1.0, 0.0));
        let ctx = context(quad(0.0, 1.0, material), Vec::new(), small_config());
        let hit = down(&ctx);
        let limit = ctx.config().max_reflection_depth;
        assert_eq!(ctx.shade(&hit, limit), Color::new(0.3, 0.6, 0.9, 1.0));
    }

    /// A lone glossy plane under an environment color: with lights and
    /// color bleeding off, occlusion is 1 everywhere, so the base path is
    /// `base * occlusion_rate` and the mirror sees the environment.
    #[test]
    fn test_glossy_blending_law() {
        let base = Color::new(0.5, 0.8, 1.0, 1.0);
        let environment = Color::new(0.2, 0.4, 0.6, 1.0);

        for g in [0.0, 0.5, 1.0] {
            let config = RenderConfig {
                render_lights: false,
                render_ambient_colors: false,
                transparent_color: environment.to_array(),
                ..small_config()
            };
            let material = Arc::new(Material::glossy(base, g, 0.0));
            let ctx = context(quad(0.0, 5.0, material), Vec::new(), config);

            let hit = down(&ctx);
            let shading = ctx.shade_detailed(&hit, 0);
            let rate = ctx.config().occlusion_rate;
            let unreflected = Color::new(base.x * rate, base.y * rate, base.z * rate, 1.0);
            let expected = unreflected * (1.0 - g) + environment * g;

            assert!((shading.ambient_rate - rate).abs() < 1e-12);
            assert!(
                (shading.color - expected).length() < 1e-9,
                "g = {}: {:?} != {:?}",
                g,
                shading.color,
                expected
            );
        }
    }

    #[test]
    fn test_parallel_mirrors_terminate() {
        let mirror = Arc::new(Material::glossy(Color::ONE, 1.0, 0.0));
        let mut triangles = quad(0.0, 50.0, mirror.clone());
        triangles.extend(quad(1.0, 50.0, mirror));
        let config = RenderConfig {
            render_occlusion: false,
            render_ambient_colors: false,
            max_reflection_depth: 4,
            ..small_config()
        };
        let ctx = context(triangles, Vec::new(), config);

        let hit = ctx.cast_ray(DVec3::new(0.1, 0.2, 0.5), DVec3::new(0.0, 0.0, -1.0));
        let color = ctx.shade(&hit, 0);

        assert!(color.to_array().iter().all(|c| (0.0..=1.0).contains(c)));
        assert_eq!(ctx.stats().deepest_bounce(), 4);
    }

    #[test]
    fn test_extreme_light_is_clamped() {
        let material = Arc::new(Material::glossy(Color::ONE, 0.3, 0.0));
        let config = RenderConfig {
            exposure: 1e6,
            ..small_config()
        };
        let light = Light::point(DVec3::new(0.0, 0.0, 1.0), Color::ONE, 1e9);
        let ctx = context(quad(0.0, 5.0, material), vec![light], config);

        let shading = ctx.shade_detailed(&down(&ctx), 0);
        assert!(shading.light.x > 1.0);
        for c in shading.color.to_array() {
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn test_glass_blends_what_is_behind() {
        let glass = Arc::new(Material::glass(Color::ONE, 1.0, 1.0));
        let config = RenderConfig {
            render_lights: false,
            render_occlusion: false,
            render_ambient_colors: false,
            transparent_color: [0.0, 1.0, 0.0, 1.0],
            ..small_config()
        };
        let ctx = context(quad(0.0, 5.0, glass), Vec::new(), config);

        // Fully transmissive, index 1: the ray passes straight through
        let color = ctx.shade(&down(&ctx), 0);
        assert!((color - Color::new(0.0, 1.0, 0.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn test_glass_refracts_oblique_ray() {
        let glass = Arc::new(Material::glass(Color::ONE, 1.0, 1.5));
        let green = Arc::new(Material::emissive(Color::new(0.0, 1.0, 0.0, 1.0), 1.0));
        let mut triangles = quad(0.0, 5.0, glass);
        triangles.extend(quad(-1.0, 50.0, green));
        let config = RenderConfig {
            render_lights: false,
            render_occlusion: false,
            render_ambient_colors: false,
            transparent_color: [1.0, 0.0, 0.0, 1.0],
            ..small_config()
        };
        let ctx = context(triangles, Vec::new(), config);

        // 45 degrees into index 1.5 bends towards the normal and reaches
        // the emitter below instead of reflecting back to the background
        let direction = DVec3::new(1.0, 0.0, -1.0).normalize();
        let hit = ctx.cast_ray(DVec3::new(-1.9, 0.2, 2.0), direction);
        assert!(hit.hit());
        let color = ctx.shade(&hit, 0);
        assert!((color - Color::new(0.0, 1.0, 0.0, 1.0)).length() < 1e-9, "{:?}", color);
    }

    #[test]
    fn test_open_sky_skips_color_bleed() {
        let base = Color::new(0.5, 0.8, 1.0, 1.0);
        let config = RenderConfig {
            render_lights: false,
            render_ambient_colors: true,
            ..small_config()
        };
        let material = Arc::new(Material::diffuse(base));
        let ctx = context(quad(0.0, 5.0, material), Vec::new(), config);

        let shading = ctx.shade_detailed(&down(&ctx), 0);
        let rate = ctx.config().occlusion_rate;

        // No ambient sample hits anything, so the base color is not pulled
        // towards black
        assert_eq!(shading.ambient_color, Color::ZERO);
        let expected = Color::new(base.x * rate, base.y * rate, base.z * rate, 1.0);
        assert!((shading.color - expected).length() < 1e-9, "{:?}", shading.color);
    }
}
