//! Cube render example.
//!
//! Renders a diffuse cube, a glass panel and a mirror on a floor, then
//! saves the color and depth images as PNG.

use std::sync::Arc;

use glint_core::{Light, Material, PreparedScene, TextureStore, Triangle};
use glint_math::{Camera, Color, DVec3};
use glint_renderer::{RenderConfig, RenderContext, Renderer};

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("glint - Cube Example");
    println!("====================");

    let start = std::time::Instant::now();
    let triangles = build_scene();
    println!("Scene built in {:?} ({} triangles)", start.elapsed(), triangles.len());

    let mut camera = Camera::new(DVec3::new(4.0, 3.0, 5.0), DVec3::new(0.0, 0.5, 0.0), 16.0 / 9.0);
    camera.fov = 40.0;

    let scene = PreparedScene {
        triangles,
        lights: vec![
            Light::point(DVec3::new(2.0, 4.0, 2.0), Color::ONE, 30.0),
            Light::directional(DVec3::new(-0.3, -1.0, -0.2), Color::new(1.0, 0.95, 0.9, 1.0), 0.6),
        ],
        camera,
    };

    let config = RenderConfig {
        width: 640,
        height: 360,
        render_caustics: true,
        caustics_samples: 2000,
        transparent_color: [0.55, 0.7, 0.9, 1.0],
        ..Default::default()
    };

    let ctx = RenderContext::new(scene, TextureStore::new(), config).expect("Failed to set up render");

    println!("Rendering {}x{}...", ctx.config().width, ctx.config().height);
    let start = std::time::Instant::now();
    let output = Renderer::new(&ctx, &camera).render();
    println!("Rendered in {:?}", start.elapsed());

    output.save_png("cube.png").expect("Failed to save image");
    output.save_depth_png("cube_depth.png").expect("Failed to save depth");
    println!("Saved to cube.png and cube_depth.png");
}

/// Quad from four corners in counter-clockwise order.
fn quad(corners: [DVec3; 4], material: &Arc<Material>) -> [Triangle; 2] {
    let [a, b, c, d] = corners;
    [
        Triangle::new(0, [a, b, c], material.clone()),
        Triangle::new(0, [a, c, d], material.clone()),
    ]
}

fn build_scene() -> Vec<Triangle> {
    let mut triangles = Vec::new();
    let v = DVec3::new;

    // Floor
    let floor = Arc::new(Material::diffuse(Color::new(0.8, 0.8, 0.75, 1.0)));
    triangles.extend(quad(
        [v(-6.0, 0.0, 6.0), v(6.0, 0.0, 6.0), v(6.0, 0.0, -6.0), v(-6.0, 0.0, -6.0)],
        &floor,
    ));

    // Unit cube resting on the floor
    let red = Arc::new(Material::diffuse(Color::new(0.8, 0.2, 0.15, 1.0)));
    let p = |x: f64, y: f64, z: f64| v(x * 0.5, y, z * 0.5);
    let faces = [
        [p(-1.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0)],
        [p(1.0, 0.0, -1.0), p(-1.0, 0.0, -1.0), p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0)],
        [p(-1.0, 0.0, -1.0), p(-1.0, 0.0, 1.0), p(-1.0, 1.0, 1.0), p(-1.0, 1.0, -1.0)],
        [p(1.0, 0.0, 1.0), p(1.0, 0.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0)],
        [p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0), p(-1.0, 1.0, -1.0)],
    ];
    for face in faces {
        triangles.extend(quad(face, &red));
    }

    // Glass panel in front of the cube
    let glass = Arc::new(Material::glass(Color::new(0.7, 0.9, 1.0, 1.0), 0.8, 1.5));
    triangles.extend(quad(
        [v(0.2, 0.0, 1.5), v(1.8, 0.0, 1.5), v(1.8, 1.4, 1.5), v(0.2, 1.4, 1.5)],
        &glass,
    ));

    // Slightly rough mirror behind
    let mirror = Arc::new(Material::glossy(Color::new(0.9, 0.9, 0.9, 1.0), 0.8, 0.1));
    triangles.extend(quad(
        [v(-3.0, 0.0, -2.0), v(3.0, 0.0, -2.0), v(3.0, 2.5, -2.0), v(-3.0, 2.5, -2.0)],
        &mirror,
    ));

    triangles
}
