//! Surface materials.
//!
//! A material is shared by reference (`Arc`) between every triangle of the
//! face group that declared it.

use glint_math::Color;
use serde::Deserialize;

use crate::format;

/// Surface description consumed by the shading code.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Base color (RGBA, 0-1)
    #[serde(deserialize_with = "format::color")]
    pub color: Color,

    /// Key into the texture store; overrides `color` where it loads
    pub texture: Option<String>,

    /// Share of light passing through the surface (glass), 0-1
    pub transmission: f64,

    /// Index of refraction used for transmitted rays
    pub index_of_refraction: f64,

    /// Share of mirror reflection, 0-1
    pub glossiness: f64,

    /// Spread of reflected/transmitted rays, 0 = perfect mirror
    pub roughness: f64,

    /// Emissive surface
    pub light: bool,

    /// Emission strength of an emissive surface
    pub light_strength: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::new(0.8, 0.8, 0.8, 1.0),
            texture: None,
            transmission: 0.0,
            index_of_refraction: 1.0,
            glossiness: 0.0,
            roughness: 0.0,
            light: false,
            light_strength: 0.0,
        }
    }
}

impl Material {
    /// Create a plain diffuse material.
    pub fn diffuse(color: Color) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    /// Create a mirror-like material.
    pub fn glossy(color: Color, glossiness: f64, roughness: f64) -> Self {
        Self {
            color,
            glossiness,
            roughness,
            ..Default::default()
        }
    }

    /// Create a glass-like material.
    pub fn glass(color: Color, transmission: f64, index_of_refraction: f64) -> Self {
        Self {
            color,
            transmission,
            index_of_refraction,
            ..Default::default()
        }
    }

    /// Create an emissive material.
    pub fn emissive(color: Color, light_strength: f64) -> Self {
        Self {
            color,
            light: true,
            light_strength,
            ..Default::default()
        }
    }

    pub fn is_glossy(&self) -> bool {
        self.glossiness > 0.0
    }

    pub fn is_transmissive(&self) -> bool {
        self.transmission > 0.0
    }

    /// Neither glossy nor transmissive: photons stop here.
    pub fn is_diffuse(&self) -> bool {
        !self.is_glossy() && !self.is_transmissive()
    }

    pub fn is_emissive(&self) -> bool {
        self.light
    }
}
