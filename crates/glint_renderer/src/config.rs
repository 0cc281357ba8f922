//! Render configuration.
//!
//! Built (or loaded) once before rendering and then only read: every
//! entry point takes `&RenderConfig`.

use std::path::{Path, PathBuf};

use glint_math::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most sub-pixel samples the adaptive antialiaser can take (an 8x8 grid).
pub const MAX_ANTIALIAS_SAMPLES: usize = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Ambient sample directions per shading point
    pub sampler_limit: usize,
    /// Photon sample points per glossy/transmissive triangle
    pub caustics_samples: usize,
    /// Global light multiplier
    pub exposure: f64,
    /// Recursion cap for reflection, refraction, glass shadows and photons
    pub max_reflection_depth: usize,
    /// Distance a ray origin is pushed along the ray before casting
    pub ray_correction: f64,
    /// Weight of ambient light from occlusion sampling
    pub occlusion_rate: f64,
    /// Hits farther than this count as unoccluded; 0 derives it from the scene
    pub ambient_radius: f64,
    /// Minimum cosine between the normal and an ambient sample direction
    pub ambient_sample_bias: f64,
    /// Share of the bled ambient color mixed into the base color
    pub ambient_color_ratio: f64,

    pub render_occlusion: bool,
    pub render_lights: bool,
    pub render_colors: bool,
    pub render_ambient_colors: bool,
    pub render_reflections: bool,
    pub render_refractions: bool,
    pub render_caustics: bool,
    pub render_bump_map: bool,

    /// Deposits farther than this from a shading point are ignored
    pub photon_spacing: f64,

    pub width: u32,
    pub height: u32,

    /// Depth or color-sum spread in a 3x3 block that triggers resampling
    pub edge_detect_threshold: f64,
    /// Sub-pixel rays per resampled pixel
    pub antialias_samples: usize,

    /// Shadow samples per directional light
    pub light_sample_count: usize,
    /// Point lights derived per emissive triangle
    pub area_light_samples: usize,

    /// Color of rays leaving the scene when no environment map is set
    pub transparent_color: [f64; 4],
    /// Equirectangular environment image
    pub environment_map: Option<PathBuf>,

    /// Worker threads; 0 uses the available parallelism
    pub threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sampler_limit: 16,
            caustics_samples: 10000,
            exposure: 0.2,
            max_reflection_depth: 6,
            ray_correction: 0.002,
            occlusion_rate: 0.2,
            ambient_radius: 2.1,
            ambient_sample_bias: 0.0,
            ambient_color_ratio: 0.5,
            render_occlusion: true,
            render_lights: true,
            render_colors: true,
            render_ambient_colors: true,
            render_reflections: true,
            render_refractions: true,
            render_caustics: false,
            render_bump_map: true,
            photon_spacing: 0.05,
            width: 1600,
            height: 900,
            edge_detect_threshold: 0.2,
            antialias_samples: 8,
            light_sample_count: 16,
            area_light_samples: 8,
            transparent_color: [0.0, 0.0, 0.0, 0.0],
            environment_map: None,
            threads: 0,
        }
    }
}

impl RenderConfig {
    /// Load a config file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: RenderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution {}x{} has no pixels",
                self.width, self.height
            )));
        }
        if self.ray_correction < 0.0 {
            return Err(ConfigError::Invalid(
                "ray_correction must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transparent_color(&self) -> Color {
        Color::from_array(self.transparent_color)
    }

    /// Antialias samples, capped at the sub-pixel grid size.
    pub fn antialias_samples(&self) -> usize {
        self.antialias_samples.min(MAX_ANTIALIAS_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.sampler_limit, 16);
        assert_eq!(config.max_reflection_depth, 6);
        assert!((config.exposure - 0.2).abs() < 1e-12);
        assert!((config.ray_correction - 0.002).abs() < 1e-12);
        assert_eq!((config.width, config.height), (1600, 900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"width": 64, "height": 48, "render_caustics": true}"#).unwrap();
        assert_eq!(config.width, 64);
        assert!(config.render_caustics);
        assert_eq!(config.sampler_limit, 16);
    }

    #[test]
    fn test_zero_resolution_is_invalid() {
        let config = RenderConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_antialias_cap() {
        let config = RenderConfig {
            antialias_samples: 500,
            ..Default::default()
        };
        assert_eq!(config.antialias_samples(), MAX_ANTIALIAS_SAMPLES);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("glint_config_{}.json", std::process::id()));
        let config = RenderConfig {
            exposure: 0.7,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = RenderConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
