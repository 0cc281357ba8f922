//! Random direction and point sampling.
//!
//! Ambient and glossy sampling draw from a fixed cache of unit vectors,
//! built once per process, filtered against the surface normal.

use std::sync::OnceLock;

use glint_core::Triangle;
use glint_math::{DVec3, VectorExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Independent shuffles of the direction cache.
const CACHE_VARIANTS: usize = 10;

/// Unit vectors per cache variant.
const CACHE_SIZE: usize = 1000;

static DIRECTION_CACHE: OnceLock<Vec<Vec<DVec3>>> = OnceLock::new();

fn direction_cache() -> &'static [Vec<DVec3>] {
    DIRECTION_CACHE.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        (0..CACHE_VARIANTS)
            .map(|_| (0..CACHE_SIZE).map(|_| random_unit_vector(&mut rng)).collect())
            .collect()
    })
}

/// Uniformly distributed unit vector (rejection sampling in the unit ball).
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> DVec3 {
    loop {
        let v = DVec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-12 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// Up to `limit` unit directions around `normal`, the normal itself first.
///
/// Cached directions are kept when `dot(direction, normal) > bias`: a bias
/// of 0 gives the hemisphere, a bias near 1 a narrow cone.
pub fn create_samples(normal: DVec3, limit: usize, bias: f64) -> Vec<DVec3> {
    let mut samples = Vec::with_capacity(limit.max(1));
    samples.push(normal);

    let mut rng = rand::thread_rng();
    let cache = direction_cache();
    let variant = &cache[rng.gen_range(0..cache.len())];
    let start = rng.gen_range(0..variant.len());

    for i in 0..variant.len() {
        if samples.len() >= limit {
            break;
        }
        let direction = variant[(start + i) % variant.len()];
        if direction.same_side(normal, bias) {
            samples.push(direction);
        }
    }

    samples
}

/// `count` random points inside a ball of `radius` around the origin.
pub fn sample_sphere(radius: f64, count: usize) -> Vec<DVec3> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| loop {
            let v = DVec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if v.length_squared() <= 1.0 {
                break v * radius;
            }
        })
        .collect()
}

/// Normals for glossy/transmissive rays: the normal alone for a perfect
/// surface, otherwise a cone narrowing as roughness drops.
pub fn jittered_normals(normal: DVec3, roughness: f64) -> Vec<DVec3> {
    if roughness <= 0.0 {
        return vec![normal];
    }
    let count = (roughness * 10.0).floor() as usize;
    create_samples(normal, count, 1.0 - roughness)
        .into_iter()
        .map(|n| n.normalize_or_self())
        .collect()
}

/// `count` uniform points on a triangle.
pub fn sample_triangle(triangle: &Triangle, count: usize) -> Vec<DVec3> {
    triangle.sample_points(count, &mut rand::thread_rng())
}
