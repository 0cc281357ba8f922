//! Immutable render state shared by every pass.
//!
//! A `RenderContext` is assembled once, single-threaded, and then only read:
//! the triangle arena, the KD-tree, textures, lights and the photon map are
//! never mutated while the worker pool runs.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use glint_core::texture::load_texture;
use glint_core::{area_lights, Light, PreparedScene, Texture, TextureStore, Triangle};
use glint_math::{Camera, Color, DVec3};

use crate::config::RenderConfig;
use crate::environment::{Environment, EnvironmentMap, SolidBackground};
use crate::error::RenderResult;
use crate::kdtree::KdTree;
use crate::photon::PhotonMap;
use crate::raycast::Intersection;

/// Share of the scene extent used as the ambient radius when the config
/// leaves it at 0.
const DERIVED_AMBIENT_RADIUS: f64 = 0.1;

/// Counters updated from every worker during a render.
#[derive(Debug, Default)]
pub struct TraceStats {
    rays: AtomicU64,
    deepest: AtomicUsize,
}

impl TraceStats {
    pub fn record_ray(&self) {
        self.rays.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_depth(&self, depth: usize) {
        self.deepest.fetch_max(depth, Ordering::Relaxed);
    }

    /// Rays cast so far.
    pub fn rays(&self) -> u64 {
        self.rays.load(Ordering::Relaxed)
    }

    /// Deepest recursion level a shading call reached.
    pub fn deepest_bounce(&self) -> usize {
        self.deepest.load(Ordering::Relaxed)
    }
}

/// Everything a ray needs to be cast and shaded.
pub struct RenderContext {
    pub(crate) config: RenderConfig,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) tree: KdTree,
    pub(crate) lights: Vec<Light>,
    pub(crate) textures: TextureStore,
    pub(crate) environment: Box<dyn Environment>,
    pub(crate) photons: PhotonMap,
    pub(crate) stats: TraceStats,
    pub(crate) pool: rayon::ThreadPool,
    pub(crate) camera: Camera,
    pub(crate) ambient_radius: f64,
    pub(crate) scene_extent: f64,
}

impl RenderContext {
    /// Validate the config, build the worker pool and the KD-tree, derive
    /// area lights, load the environment and (when enabled) trace the
    /// photon map.
    pub fn new(scene: PreparedScene, textures: TextureStore, config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;

        let PreparedScene {
            mut triangles,
            mut lights,
            camera,
        } = scene;

        // The tree and the photon side table index the arena by id
        for (index, triangle) in triangles.iter_mut().enumerate() {
            triangle.id = index;
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("glint-worker-{}", i))
            .build()?;

        let start = std::time::Instant::now();
        let tree = KdTree::build(&triangles);
        log::info!(
            "Built KD-tree over {} triangles in {:.2?}",
            triangles.len(),
            start.elapsed()
        );

        lights.extend(area_lights(&triangles, config.area_light_samples));

        let environment: Box<dyn Environment> = match &config.environment_map {
            Some(path) => {
                let texture = load_texture(path)?;
                log::info!(
                    "Environment map {} ({}x{})",
                    path.display(),
                    texture.width,
                    texture.height
                );
                Box::new(EnvironmentMap::new(texture))
            }
            None => Box::new(SolidBackground::new(config.transparent_color())),
        };

        let bounds = tree.bounds();
        let scene_extent = if bounds.is_empty() {
            0.0
        } else {
            bounds.extent().length()
        };
        let ambient_radius = if config.ambient_radius > 0.0 {
            config.ambient_radius
        } else {
            scene_extent * DERIVED_AMBIENT_RADIUS
        };

        let mut ctx = Self {
            config,
            triangles,
            tree,
            lights,
            textures,
            environment,
            photons: PhotonMap::default(),
            stats: TraceStats::default(),
            pool,
            camera,
            ambient_radius,
            scene_extent,
        };

        if ctx.config.render_caustics {
            let start = std::time::Instant::now();
            let photons = PhotonMap::build(&ctx);
            log::info!(
                "Photon map: {} deposits in {:.2?}",
                photons.len(),
                start.elapsed()
            );
            ctx.photons = photons;
        }

        Ok(ctx)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    /// Scene lights followed by the lights derived from emissive surfaces.
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn photons(&self) -> &PhotonMap {
        &self.photons
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }

    /// Diagonal of the scene bounds.
    pub fn scene_extent(&self) -> f64 {
        self.scene_extent
    }

    pub fn ambient_radius(&self) -> f64 {
        self.ambient_radius
    }

    pub fn triangle_of(&self, hit: &Intersection) -> Option<&Triangle> {
        hit.triangle.and_then(|index| self.triangles.get(index))
    }

    /// Radiance of a ray that left the scene.
    pub fn background(&self, direction: DVec3) -> Color {
        self.environment.radiance(direction)
    }

    /// Unlit surface color at a point: the texture sample when the material
    /// has a loaded texture, otherwise the material color. White when color
    /// rendering is off.
    pub fn surface_color(&self, triangle: &Triangle, point: DVec3) -> Color {
        if !self.config.render_colors {
            return Color::ONE;
        }
        match self.texture_of(triangle) {
            Some(texture) => {
                let uv = triangle.tex_coord_at(point);
                texture.sample(uv.x, uv.y)
            }
            None => triangle.material.color,
        }
    }

    pub(crate) fn texture_of(&self, triangle: &Triangle) -> Option<&Texture> {
        triangle
            .material
            .texture
            .as_deref()
            .and_then(|key| self.textures.get(key))
    }
}
