//! Scene lights and lights derived from emissive geometry.

use glint_math::{Color, DVec3};
use serde::Deserialize;

use crate::{format, Triangle};

/// Distance derived lights sit above their emitting surface.
const AREA_LIGHT_LIFT: f64 = 1e-3;

/// A point or directional light.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Light {
    /// Position of a point light
    #[serde(deserialize_with = "format::vec3")]
    pub position: DVec3,

    /// Light color; alpha 0 disables the light's contribution
    #[serde(deserialize_with = "format::color")]
    pub color: Color,

    /// Emitted strength
    #[serde(alias = "light_strength")]
    pub strength: f64,

    /// Inactive lights are dropped during scene preparation
    pub active: bool,

    /// Parallel light arriving along `direction`
    pub directional: bool,

    /// Travel direction of a directional light
    #[serde(deserialize_with = "format::vec3")]
    pub direction: DVec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            color: Color::ONE,
            strength: 1.0,
            active: true,
            directional: false,
            direction: DVec3::NEG_Z,
        }
    }
}

impl Light {
    /// Create a point light.
    pub fn point(position: DVec3, color: Color, strength: f64) -> Self {
        Self {
            position,
            color,
            strength,
            ..Default::default()
        }
    }

    /// Create a directional light travelling along `direction`.
    pub fn directional(direction: DVec3, color: Color, strength: f64) -> Self {
        Self {
            color,
            strength,
            directional: true,
            direction: direction.normalize_or_zero(),
            ..Default::default()
        }
    }
}

/// Point lights scattered over every emissive triangle.
///
/// Each emissive triangle contributes `samples` lights at random surface
/// points, lifted slightly along the face normal, sharing the material's
/// strength evenly.
pub fn area_lights(triangles: &[Triangle], samples: usize) -> Vec<Light> {
    if samples == 0 {
        return Vec::new();
    }

    let mut rng = rand::thread_rng();
    let mut lights = Vec::new();

    for triangle in triangles.iter().filter(|t| t.material.is_emissive()) {
        let strength = triangle.material.light_strength / samples as f64;
        let lift = triangle.face_normal() * AREA_LIGHT_LIFT;
        for position in triangle.sample_points(samples, &mut rng) {
            lights.push(Light::point(position + lift, triangle.material.color, strength));
        }
    }

    if !lights.is_empty() {
        log::debug!("Derived {} point lights from emissive surfaces", lights.len());
    }
    lights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Material;
    use std::sync::Arc;

    fn triangle(id: usize, material: Material) -> Triangle {
        Triangle::new(
            id,
            [DVec3::ZERO, DVec3::X, DVec3::Y],
            Arc::new(material),
        )
    }

    #[test]
    fn test_light_from_json() {
        let light: Light = serde_json::from_str(
            r#"{"position": [0, 0, 3, 1], "color": [1, 1, 1, 1], "light_strength": 5}"#,
        )
        .unwrap();

        assert_eq!(light.position, DVec3::new(0.0, 0.0, 3.0));
        assert_eq!(light.strength, 5.0);
        assert!(light.active);
        assert!(!light.directional);
    }

    #[test]
    fn test_area_lights_only_from_emitters() {
        let triangles = vec![
            triangle(0, Material::default()),
            triangle(1, Material::emissive(Color::new(1.0, 0.5, 0.0, 1.0), 8.0)),
        ];

        let lights = area_lights(&triangles, 4);
        assert_eq!(lights.len(), 4);
        for light in &lights {
            assert!((light.strength - 2.0).abs() < 1e-12);
            assert_eq!(light.color, Color::new(1.0, 0.5, 0.0, 1.0));
            assert!((light.position.z - AREA_LIGHT_LIFT).abs() < 1e-12);
        }
    }

    #[test]
    fn test_no_samples_no_lights() {
        let triangles = vec![triangle(0, Material::emissive(Color::ONE, 8.0))];
        assert!(area_lights(&triangles, 0).is_empty());
    }
}
