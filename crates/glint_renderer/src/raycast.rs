//! Casting a ray into the scene and building the shading normal.

use glint_core::Triangle;
use glint_math::{DVec3, Ray, VectorExt, DIFF};

use crate::context::RenderContext;
use crate::triangle::TriangleHit;

/// Result of casting a ray. A miss is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Arena index of the hit triangle, `None` on a miss
    pub triangle: Option<usize>,
    /// World-space hit point
    pub point: DVec3,
    /// Shading normal, on the side the ray arrived from
    pub normal: DVec3,
    /// Origin the ray was cast from (before the correction nudge)
    pub ray_start: DVec3,
    pub ray_dir: DVec3,
    /// Distance from the nudged origin; -1 on a miss
    pub dist: f64,
    pub front_face: bool,
}

impl Intersection {
    pub fn miss(ray_start: DVec3, ray_dir: DVec3) -> Self {
        Self {
            triangle: None,
            point: DVec3::ZERO,
            normal: DVec3::ZERO,
            ray_start,
            ray_dir,
            dist: -1.0,
            front_face: false,
        }
    }

    pub fn hit(&self) -> bool {
        self.triangle.is_some()
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self::miss(DVec3::ZERO, DVec3::ZERO)
    }
}

impl RenderContext {
    /// Closest opaque surface along `direction` from `origin`.
    ///
    /// The origin is first pushed `ray_correction` along the ray. Texels
    /// with alpha below 1 are skipped in favor of the next surface behind
    /// them.
    pub fn cast_ray(&self, origin: DVec3, direction: DVec3) -> Intersection {
        self.stats.record_ray();

        let ray = Ray::new(origin, direction).nudged(self.config.ray_correction);
        let hit = self
            .tree
            .intersect(&self.triangles, &ray, |triangle, hit| {
                self.is_opaque_at(triangle, hit.point)
            })
            .filter(|hit| hit.dist >= DIFF);

        let Some(hit) = hit else {
            return Intersection::miss(origin, direction);
        };

        let triangle = &self.triangles[hit.triangle];
        Intersection {
            triangle: Some(hit.triangle),
            point: hit.point,
            normal: self.shading_normal(triangle, &hit),
            ray_start: origin,
            ray_dir: direction,
            dist: hit.dist,
            front_face: hit.front_face,
        }
    }

    fn is_opaque_at(&self, triangle: &Triangle, point: DVec3) -> bool {
        match self.texture_of(triangle) {
            Some(texture) if texture.has_alpha() => {
                let uv = triangle.tex_coord_at(point);
                texture.sample(uv.x, uv.y).w >= 1.0
            }
            _ => true,
        }
    }

    /// Face normal, replaced by the interpolated vertex normal on smooth
    /// triangles, then perturbed by the material's bump map.
    fn shading_normal(&self, triangle: &Triangle, hit: &TriangleHit) -> DVec3 {
        let mut normal = hit.normal;

        if triangle.smooth {
            let [n1, n2, n3] = triangle.normals;
            // Vertex normals follow the winding; keep them on the hit side
            let side = if n1.same_side(hit.normal, 0.0) { 1.0 } else { -1.0 };
            let smooth = triangle.barycentric(hit.point).blend3(n1, n2, n3) * side;
            if smooth.length_squared() > DIFF {
                normal = smooth.normalize();
            }
        }

        if self.config.render_bump_map {
            let bump = triangle
                .material
                .texture
                .as_deref()
                .and_then(|key| self.textures.bump_map(key));
            if let Some(bump) = bump {
                let uv = triangle.tex_coord_at(hit.point);
                normal = perturb_normal(normal, bump.sample(uv.x, uv.y));
            }
        }

        normal
    }
}

/// Rotate a tangent-space normal into the frame around `normal`.
pub fn perturb_normal(normal: DVec3, local: DVec3) -> DVec3 {
    let mut tangent = normal.cross(DVec3::NEG_Y);
    if tangent.length_squared() < DIFF {
        tangent = normal.cross(DVec3::Z);
    }
    let tangent = tangent.normalize_or_self();
    let bitangent = normal.cross(tangent);

    (tangent * local.x + bitangent * local.y + normal * local.z).normalize_or_self()
}
