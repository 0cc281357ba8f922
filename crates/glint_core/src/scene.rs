//! Scene description and its preparation into render-ready geometry.
//!
//! Lifecycle: parsed (`Scene::load`) → flattened (child transforms composed
//! into world space) → unified into one triangle arena → handed to the
//! renderer as a `PreparedScene`.

use std::collections::BTreeMap;
use std::path::Path;

use glint_math::{Camera, DVec3};
use serde::Deserialize;
use thiserror::Error;

use crate::object::{flatten, Object};
use crate::{format, Light, Triangle};

/// Errors that can occur while loading or preparing a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed scene: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Object '{object}' references vertex {index} but has {count} vertices")]
    InvalidFace {
        object: String,
        index: i64,
        count: usize,
    },

    #[error("Object '{object}' has a face with only {len} indices")]
    ShortFace { object: String, len: usize },

    #[error("Scene has no observer to render from")]
    NoCamera,
}

pub type SceneResult<T> = Result<T, SceneError>;

/// A camera as written in the scene file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Observer {
    #[serde(deserialize_with = "format::vec3")]
    pub position: DVec3,

    #[serde(deserialize_with = "format::vec3")]
    pub target: DVec3,

    #[serde(deserialize_with = "format::vec3")]
    pub up: DVec3,

    /// Vertical field of view in degrees
    pub fov: f64,

    /// Width / height; 0 means "use the output resolution"
    pub aspect_ratio: f64,

    pub near: f64,
    pub far: f64,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            position: DVec3::new(0.0, 0.0, 5.0),
            target: DVec3::ZERO,
            up: DVec3::Y,
            fov: 45.0,
            aspect_ratio: 0.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Observer {
    pub fn camera(&self) -> Camera {
        Camera {
            position: self.position,
            target: self.target,
            up: self.up,
            fov: self.fov,
            aspect_ratio: self.aspect_ratio,
            near: self.near,
            far: self.far,
        }
    }
}

/// The scene graph as loaded from disk.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub objects: BTreeMap<String, Object>,
    pub lights: Vec<Light>,
    pub observers: Vec<Observer>,
}

/// Everything the renderer needs, in world space.
#[derive(Clone, Debug)]
pub struct PreparedScene {
    /// The merged triangle arena; `triangles[i].id == i`
    pub triangles: Vec<Triangle>,

    /// Active scene lights (derived area lights are added by the renderer)
    pub lights: Vec<Light>,

    /// Camera to render from
    pub camera: Camera,
}

impl Scene {
    /// Load a scene from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let scene = Self::from_json(&text)?;
        log::info!(
            "Loaded scene {}: {} objects, {} lights, {} observers",
            path.display(),
            scene.objects.len(),
            scene.lights.len(),
            scene.observers.len()
        );
        Ok(scene)
    }

    /// Parse a scene from JSON text.
    pub fn from_json(text: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Lift all children into the top-level object map with absolute
    /// transforms.
    pub fn flatten(&mut self) {
        let objects = std::mem::take(&mut self.objects);
        self.objects = flatten(objects);
    }

    /// Transform every object into world space and merge all faces into a
    /// single triangle arena with incremental ids.
    ///
    /// Expects a flattened scene; nested children are ignored.
    pub fn unify(&self) -> SceneResult<Vec<Triangle>> {
        let mut next_id = 0;
        let mut triangles = Vec::new();

        for (name, object) in &self.objects {
            let emitted = object.triangles(name, &mut next_id)?;
            log::debug!("Object '{}': {} triangles", name, emitted.len());
            triangles.extend(emitted);
        }

        Ok(triangles)
    }

    /// Flatten, unify, and pick the camera.
    pub fn prepare(mut self) -> SceneResult<PreparedScene> {
        let camera = self
            .observers
            .first()
            .map(Observer::camera)
            .ok_or(SceneError::NoCamera)?;

        self.flatten();
        let triangles = self.unify()?;
        let lights: Vec<Light> = self.lights.into_iter().filter(|l| l.active).collect();

        log::info!(
            "Prepared {} objects into {} triangles with {} active lights",
            self.objects.len(),
            triangles.len(),
            lights.len()
        );

        Ok(PreparedScene {
            triangles,
            lights,
            camera,
        })
    }
}
