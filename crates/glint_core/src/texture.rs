//! Texture loading and caching for materials.
//!
//! Textures are loaded once before rendering and shared read-only by all
//! render threads. A material texture `wood.png` may have a bump map
//! companion `wood_bump.png` in the same directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glint_math::{Color, DVec3, VectorExt};
use thiserror::Error;

use crate::Triangle;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture: {0}")]
    LoadError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Wrap a texture coordinate into [0, 1).
///
/// Negative coordinates wrap by magnitude, so 1.25 and -0.25 both land
/// on 0.25.
#[inline]
fn wrap_coordinate(s: f64) -> f64 {
    s.abs().fract()
}

/// A loaded texture with pixel data.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// RGBA samples, 0-1, row-major with row 0 at the top of the image
    pub pixels: Vec<Color>,

    /// Original file path (for debugging)
    pub path: String,

    has_alpha: bool,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<Color>, path: impl Into<String>) -> Self {
        let has_alpha = pixels.iter().any(|p| p.w < 1.0);
        Self {
            width,
            height,
            pixels,
            path: path.into(),
            has_alpha,
        }
    }

    /// Whether any texel is less than fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Nearest-texel lookup at UV coordinates, (0, 0) at the bottom-left.
    pub fn sample(&self, u: f64, v: f64) -> Color {
        let (x, y) = self.texel_coordinates(u, v);
        self.texel(x, y)
    }

    /// Texel at integer coordinates; out of range reads are opaque black.
    pub fn texel(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::new(0.0, 0.0, 0.0, 1.0);
        }
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .copied()
            .unwrap_or(Color::new(0.0, 0.0, 0.0, 1.0))
    }

    fn texel_coordinates(&self, u: f64, v: f64) -> (u32, u32) {
        let u = wrap_coordinate(u);
        // Flip V: image rows run top to bottom
        let v = 1.0 - wrap_coordinate(v);

        let x = ((u * self.width as f64) as u32).min(self.width.saturating_sub(1));
        let y = ((v * self.height as f64) as u32).min(self.height.saturating_sub(1));
        (x, y)
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Color>()
    }
}

/// Tangent-space normals decoded from an RGB normal map.
#[derive(Clone, Debug)]
pub struct BumpMap {
    pub width: u32,
    pub height: u32,
    normals: Vec<DVec3>,
}

impl BumpMap {
    /// Decode every texel as `normalize(2 * normalize(rgb) - 1)`, so a
    /// texel of `(0.5, 0.5, 1/sqrt(2))` is the unperturbed `+Z`.
    pub fn from_normal_map(texture: &Texture) -> Self {
        let normals = texture
            .pixels
            .iter()
            .map(|c| {
                let rgb = DVec3::new(c.x, c.y, c.z).normalize_or_self();
                (rgb * 2.0 - DVec3::ONE).normalize_or_self()
            })
            .collect();

        Self {
            width: texture.width,
            height: texture.height,
            normals,
        }
    }

    /// Tangent-space normal at UV coordinates (same wrapping as `Texture`).
    pub fn sample(&self, u: f64, v: f64) -> DVec3 {
        if self.width == 0 || self.height == 0 {
            return DVec3::Z;
        }
        let u = wrap_coordinate(u);
        let v = 1.0 - wrap_coordinate(v);
        let x = ((u * self.width as f64) as u32).min(self.width - 1);
        let y = ((v * self.height as f64) as u32).min(self.height - 1);
        self.normals
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(DVec3::Z)
    }
}

/// Cache for loaded textures and bump maps, keyed by the material's
/// texture key.
#[derive(Default)]
pub struct TextureStore {
    /// Cached textures by key
    textures: HashMap<String, Arc<Texture>>,

    /// Bump maps by the key of the texture they belong to
    bump_maps: HashMap<String, Arc<BumpMap>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureStore {
    /// Create a new empty texture store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a texture store with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Default::default()
        }
    }

    /// Register an already decoded texture under a key.
    pub fn insert(&mut self, key: impl Into<String>, texture: Texture) {
        self.textures.insert(key.into(), Arc::new(texture));
    }

    /// Register a bump map for a texture key.
    pub fn insert_bump_map(&mut self, key: impl Into<String>, bump_map: BumpMap) {
        self.bump_maps.insert(key.into(), Arc::new(bump_map));
    }

    /// Load a texture from file, using cache if available.
    pub fn load(&mut self, key: &str) -> TextureResult<Arc<Texture>> {
        if let Some(texture) = self.textures.get(key) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(key);
        let texture = Arc::new(load_texture(&full_path)?);
        self.textures.insert(key.to_string(), texture.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            key,
            texture.width,
            texture.height,
            texture.size_bytes() as f64 / 1024.0
        );

        Ok(texture)
    }

    /// Load every texture referenced by the triangles' materials, plus any
    /// `_bump` companions. Failures are logged and skipped; affected
    /// surfaces fall back to their flat color. Returns the number of
    /// textures available afterwards.
    pub fn load_for_triangles(&mut self, triangles: &[Triangle]) -> usize {
        let mut keys: Vec<&str> = triangles
            .iter()
            .filter_map(|t| t.material.texture.as_deref())
            .collect();
        keys.sort_unstable();
        keys.dedup();

        for key in keys {
            if let Err(err) = self.load(key) {
                log::warn!("Texture '{}' unavailable, using flat color: {}", key, err);
                continue;
            }

            if self.bump_maps.contains_key(key) {
                continue;
            }
            let bump_path = self.resolve_path(&bump_map_key(key));
            if !bump_path.exists() {
                continue;
            }
            match load_texture(&bump_path) {
                Ok(normal_map) => {
                    log::debug!("Loaded bump map: {}", bump_path.display());
                    self.insert_bump_map(key, BumpMap::from_normal_map(&normal_map));
                }
                Err(err) => log::warn!("Bump map {} unreadable: {}", bump_path.display(), err),
            }
        }

        self.textures.len()
    }

    /// Get a cached texture without loading.
    pub fn get(&self, key: &str) -> Option<&Texture> {
        self.textures.get(key).map(|t| t.as_ref())
    }

    /// Get the bump map registered for a texture key.
    pub fn bump_map(&self, key: &str) -> Option<&BumpMap> {
        self.bump_maps.get(key).map(|b| b.as_ref())
    }

    /// Get the number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if store is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Resolve a path relative to the base directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// `dir/wood.png` → `dir/wood_bump.png`
fn bump_map_key(key: &str) -> String {
    let path = Path::new(key);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = match path.extension() {
        Some(ext) => format!("{}_bump.{}", stem, ext.to_string_lossy()),
        None => format!("{}_bump", stem),
    };
    path.with_file_name(file).to_string_lossy().into_owned()
}

/// Load a texture from a file path.
pub fn load_texture(path: &Path) -> TextureResult<Texture> {
    let img = image::open(path).map_err(|e| {
        TextureError::LoadError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixels: Vec<Color> = rgba
        .pixels()
        .map(|p| {
            Color::new(
                p[0] as f64 / 255.0,
                p[1] as f64 / 255.0,
                p[2] as f64 / 255.0,
                p[3] as f64 / 255.0,
            )
        })
        .collect();

    Ok(Texture::new(
        width,
        height,
        pixels,
        path.to_string_lossy().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four texels in one row: red, green, blue, white.
    fn strip() -> Texture {
        Texture::new(
            4,
            1,
            vec![
                Color::new(1.0, 0.0, 0.0, 1.0),
                Color::new(0.0, 1.0, 0.0, 1.0),
                Color::new(0.0, 0.0, 1.0, 1.0),
                Color::new(1.0, 1.0, 1.0, 1.0),
            ],
            "<strip>",
        )
    }

    #[test]
    fn test_single_texel_texture() {
        let tex = Texture::new(1, 1, vec![Color::new(1.0, 0.5, 0.0, 1.0)], "<solid>");
        let sample = tex.sample(0.5, 0.5);
        assert!((sample.x - 1.0).abs() < 0.001);
        assert!((sample.y - 0.5).abs() < 0.001);
        assert!(!tex.has_alpha());
    }

    #[test]
    fn test_uv_wraps_both_signs() {
        let tex = strip();
        let inside = tex.sample(0.25, 0.5);

        assert_eq!(inside, Color::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(tex.sample(1.25, 0.5), inside);
        assert_eq!(tex.sample(-0.25, 0.5), inside);
        assert_eq!(tex.sample(3.25, 0.5), inside);
    }

    #[test]
    fn test_v_is_flipped() {
        // Two rows: top red, bottom blue
        let tex = Texture::new(
            1,
            2,
            vec![Color::new(1.0, 0.0, 0.0, 1.0), Color::new(0.0, 0.0, 1.0, 1.0)],
            "<column>",
        );
        assert_eq!(tex.sample(0.5, 0.9), Color::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(tex.sample(0.5, 0.1), Color::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_alpha_detection() {
        let tex = Texture::new(1, 1, vec![Color::new(1.0, 1.0, 1.0, 0.0)], "<clear>");
        assert!(tex.has_alpha());
    }

    #[test]
    fn test_neutral_normal_map_points_up() {
        let neutral = Color::new(0.5, 0.5, std::f64::consts::FRAC_1_SQRT_2, 1.0);
        let bump = BumpMap::from_normal_map(&Texture::new(2, 2, vec![neutral; 4], "<flat>"));
        assert!((bump.sample(0.3, 0.7) - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_normal_map_decodes_rgb() {
        let bump = BumpMap::from_normal_map(&Texture::new(1, 1, vec![Color::new(1.0, 0.5, 0.5, 1.0)], "<tilted>"));
        let n = bump.sample(0.5, 0.5);
        assert!((n - DVec3::new(0.925, -0.268, -0.268)).length() < 1e-3, "{:?}", n);
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bump_map_key() {
        assert_eq!(bump_map_key("wood.png"), "wood_bump.png");
        assert_eq!(bump_map_key("maps/wood.png"), "maps/wood_bump.png");
    }

    #[test]
    fn test_missing_texture_is_not_fatal() {
        let mut store = TextureStore::with_base_dir("/nonexistent");
        let material = crate::Material {
            texture: Some("missing.png".to_string()),
            ..Default::default()
        };
        let tri = Triangle::new(
            0,
            [DVec3::ZERO, DVec3::X, DVec3::Y],
            Arc::new(material),
        );

        assert_eq!(store.load_for_triangles(&[tri]), 0);
        assert!(store.get("missing.png").is_none());
        assert!(store.load("missing.png").is_err());
    }
}
