//! glint renderer - CPU ray tracing over a KD-tree.
//!
//! Renders a `PreparedScene` with:
//! - Direct lighting from point, directional and emissive-surface lights,
//!   including light passing through flat glass
//! - Ambient occlusion and color bleeding
//! - Recursive reflection and refraction with roughness
//! - Optional photon-mapped caustics
//! - Adaptive antialiasing on edges
//!
//! # Example
//!
//! ```ignore
//! use glint_core::{Scene, TextureStore};
//! use glint_renderer::{RenderConfig, RenderContext, Renderer};
//!
//! let scene = Scene::load("scene.json")?.prepare()?;
//! let camera = scene.camera;
//! let ctx = RenderContext::new(scene, TextureStore::new(), RenderConfig::default())?;
//! Renderer::new(&ctx, &camera).render().save_png("out.png")?;
//! ```

mod ambient;
mod antialias;
mod bucket;
mod camera;
mod color;
mod config;
mod context;
mod environment;
mod error;
mod kdtree;
mod lighting;
mod photon;
mod raycast;
mod renderer;
mod sampling;
mod shading;
mod triangle;

pub use ambient::AmbientSamples;
pub use antialias::{needs_resample, resample_pixel};
pub use bucket::{generate_buckets, render_buckets, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use camera::PixelProjector;
pub use config::{ConfigError, RenderConfig, MAX_ANTIALIAS_SAMPLES};
pub use context::{RenderContext, TraceStats};
pub use environment::{Environment, EnvironmentMap, SolidBackground};
pub use error::{RenderError, RenderResult};
pub use kdtree::{KdTree, Node, TreeStats};
pub use photon::{Photon, PhotonMap};
pub use raycast::{perturb_normal, Intersection};
pub use renderer::{PixelStorage, RenderOutput, Renderer};
pub use sampling::{create_samples, jittered_normals, sample_sphere, sample_triangle};
pub use shading::Shading;
pub use triangle::{intersect_triangle, TriangleHit};
