//! Render-ready triangles.
//!
//! After scene preparation every triangle lives in one arena
//! (`PreparedScene::triangles`) and `id` is its index there. The renderer
//! uses the id to recognise "the surface this ray started from" and to key
//! side tables such as the photon map.

use std::sync::Arc;

use glint_math::{barycentric, Aabb, Barycentric, DVec2, DVec3, VectorExt};
use rand::Rng;

use crate::Material;

/// A world-space triangle with per-vertex normals and texture coordinates.
#[derive(Clone, Debug)]
pub struct Triangle {
    /// Index into the triangle arena
    pub id: usize,

    /// Vertex positions in world space
    pub vertices: [DVec3; 3],

    /// Per-vertex normals (used when `smooth` is set)
    pub normals: [DVec3; 3],

    /// Per-vertex texture coordinates
    pub tex_coords: [DVec2; 3],

    /// Shared material
    pub material: Arc<Material>,

    /// Interpolate vertex normals instead of using the face normal
    pub smooth: bool,
}

impl Triangle {
    /// Create a flat-shaded triangle; vertex normals default to the face
    /// normal and texture coordinates to zero.
    pub fn new(id: usize, vertices: [DVec3; 3], material: Arc<Material>) -> Self {
        let normal = face_normal(&vertices);
        Self {
            id,
            vertices,
            normals: [normal; 3],
            tex_coords: [DVec2::ZERO; 3],
            material,
            smooth: false,
        }
    }

    /// Set per-vertex normals and enable smooth shading.
    pub fn with_smooth_normals(mut self, normals: [DVec3; 3]) -> Self {
        self.normals = normals;
        self.smooth = true;
        self
    }

    /// Set per-vertex texture coordinates.
    pub fn with_tex_coords(mut self, tex_coords: [DVec2; 3]) -> Self {
        self.tex_coords = tex_coords;
        self
    }

    /// Average of the three vertices; the KD-tree splits on these.
    pub fn midpoint(&self) -> DVec3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }

    pub fn bounding_box(&self) -> Aabb {
        let mut bbox = Aabb::from_points(self.vertices[0], self.vertices[1]);
        bbox.extend_point(self.vertices[2]);
        bbox
    }

    /// Unit normal following the vertex winding (zero for degenerate
    /// triangles).
    pub fn face_normal(&self) -> DVec3 {
        face_normal(&self.vertices)
    }

    /// Barycentric weights of a point on (or near) the triangle.
    pub fn barycentric(&self, point: DVec3) -> Barycentric {
        let [p1, p2, p3] = self.vertices;
        barycentric(p1, p2, p3, point)
    }

    /// Interpolated texture coordinate at a point on the triangle.
    pub fn tex_coord_at(&self, point: DVec3) -> DVec2 {
        let [t1, t2, t3] = self.tex_coords;
        self.barycentric(point).blend2(t1, t2, t3)
    }

    /// Uniform random point inside the triangle.
    ///
    /// Two sorted uniform draws split [0, 1] into three barycentric weights,
    /// which always stay inside the simplex.
    pub fn sample_point<R: Rng + ?Sized>(&self, rng: &mut R) -> DVec3 {
        let mut a: f64 = rng.gen();
        let mut b: f64 = rng.gen();
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        let [p1, p2, p3] = self.vertices;
        p1 * a + p2 * (b - a) + p3 * (1.0 - b)
    }

    /// `count` random points inside the triangle.
    pub fn sample_points<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<DVec3> {
        (0..count).map(|_| self.sample_point(rng)).collect()
    }
}

fn face_normal(vertices: &[DVec3; 3]) -> DVec3 {
    let [p1, p2, p3] = *vertices;
    (p2 - p1).cross(p3 - p1).normalize_or_self()
}
