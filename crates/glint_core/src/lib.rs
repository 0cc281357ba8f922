//! glint core - scene graph, materials and textures.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `Scene`, `Object`, `Material`, `Light`
//! - **Render-ready geometry**: `PreparedScene` with a flat `Triangle` arena
//! - **Textures**: `Texture`, `BumpMap` and the `TextureStore` cache
//!
//! # Example
//!
//! ```ignore
//! use glint_core::{Scene, TextureStore};
//!
//! let scene = Scene::load("scene.json")?;
//! let prepared = scene.prepare()?;
//! let mut textures = TextureStore::with_base_dir("scenes/");
//! textures.load_for_triangles(&prepared.triangles);
//! println!("{} triangles, {} lights", prepared.triangles.len(), prepared.lights.len());
//! ```

mod format;
pub mod light;
pub mod material;
pub mod object;
pub mod scene;
pub mod texture;
pub mod triangle;

// Re-export commonly used types
pub use light::{area_lights, Light};
pub use material::Material;
pub use object::{MaterialGroup, Object};
pub use scene::{Observer, PreparedScene, Scene, SceneError, SceneResult};
pub use texture::{BumpMap, Texture, TextureError, TextureResult, TextureStore};
pub use triangle::Triangle;
