use glint_core::TextureError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures while setting up or writing out a render.
///
/// Nothing inside the render passes can fail; numerical edge cases only
/// degrade pixels.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Environment map unavailable: {0}")]
    Environment(#[from] TextureError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type RenderResult<T> = Result<T, RenderError>;
