//! glint - render a JSON scene to PNG.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use glint_core::{Scene, TextureStore};
use glint_renderer::{RenderConfig, RenderContext, Renderer};

mod cli;

use cli::Args;

fn init_logger(level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into());

    if let Some(path) = &args.create_config {
        RenderConfig::default()
            .save(path)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        log::info!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let scene_path = args.scene.as_deref().context("No scene file given")?;

    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some((width, height)) = args.size {
        config.width = width;
        config.height = height;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }

    let scene = Scene::load(scene_path)
        .with_context(|| format!("Failed to load scene {}", scene_path.display()))?
        .prepare()
        .context("Failed to prepare scene")?;

    let base_dir = scene_path.parent().unwrap_or(Path::new("."));
    let mut textures = TextureStore::with_base_dir(base_dir);
    let loaded = textures.load_for_triangles(&scene.triangles);
    log::info!("{} textures loaded", loaded);

    let camera = scene.camera;
    let ctx = RenderContext::new(scene, textures, config).context("Failed to set up renderer")?;

    let output = Renderer::new(&ctx, &camera).render();

    output
        .save_png(&args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    if let Some(path) = &args.depth_output {
        output
            .save_depth_png(path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        log::info!("Saved depth to {}", path.display());
    }

    Ok(())
}
