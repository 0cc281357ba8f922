//! Ambient occlusion and color bleeding from one shared sample set.

use glint_math::{Color, DVec3, DIFF};

use crate::color::average;
use crate::context::RenderContext;
use crate::raycast::Intersection;
use crate::sampling::create_samples;

/// Sample rays cast around a shading point. `hits[i]` is the result of
/// casting along `directions[i]`; hits on the originating triangle count
/// as misses.
#[derive(Debug, Clone, Default)]
pub struct AmbientSamples {
    pub directions: Vec<DVec3>,
    pub hits: Vec<Intersection>,
}

impl RenderContext {
    pub fn ambient_samples(&self, hit: &Intersection) -> AmbientSamples {
        let directions = create_samples(
            hit.normal,
            self.config.sampler_limit,
            self.config.ambient_sample_bias,
        );
        let hits = directions
            .iter()
            .map(|&direction| {
                let sample = self.cast_ray(hit.point, direction);
                if sample.triangle == hit.triangle {
                    Intersection::miss(hit.point, direction)
                } else {
                    sample
                }
            })
            .collect();

        AmbientSamples { directions, hits }
    }

    /// Unoccluded share in [0, 1], weighting each hit by its distance
    /// inside the ambient radius. 1.0 when nothing was hit.
    pub fn ambient_occlusion(&self, samples: &AmbientSamples) -> f64 {
        let radius = self.ambient_radius;
        if samples.directions.is_empty() || radius <= 0.0 {
            return 1.0;
        }

        let hit_distances: Vec<f64> = samples
            .hits
            .iter()
            .filter(|h| h.hit())
            .map(|h| h.dist.min(radius))
            .collect();
        if hit_distances.is_empty() {
            return 1.0;
        }

        let misses = samples.directions.len() - hit_distances.len();
        let open: f64 = hit_distances.iter().sum::<f64>() + misses as f64 * radius;
        open / (radius * samples.directions.len() as f64)
    }

    /// Mean surface color of the samples that hit something.
    pub fn ambient_color(&self, samples: &AmbientSamples) -> Option<Color> {
        let colors: Vec<Color> = samples
            .hits
            .iter()
            .filter_map(|h| {
                let triangle = self.triangle_of(h)?;
                Some(self.surface_color(triangle, h.point))
            })
            .filter(|c| c.length() > DIFF)
            .collect();

        if colors.is_empty() {
            None
        } else {
            Some(average(colors))
        }
    }
}
