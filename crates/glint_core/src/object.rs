//! Scene objects: local geometry plus a tree of transformed children.
//!
//! Faces index the object's vertex, normal and texture coordinate arrays
//! with one shared index. A face is `[a, b, c]` or `[a, b, c, smooth]`,
//! where `smooth == 1` turns on normal interpolation for that triangle.

use std::collections::BTreeMap;
use std::sync::Arc;

use glint_math::{DMat4, DVec2, DVec3, MatrixExt};
use serde::Deserialize;

use crate::scene::{SceneError, SceneResult};
use crate::{format, Material, Triangle};

/// A material together with the faces that use it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MaterialGroup {
    #[serde(flatten)]
    pub material: Material,

    /// Faces as vertex index lists
    #[serde(default)]
    pub indices: Vec<Vec<i64>>,
}

/// A node of the scene graph.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Object {
    /// Local vertex positions
    #[serde(deserialize_with = "format::vec3_list")]
    pub vertices: Vec<DVec3>,

    /// Local vertex normals (optional, one per vertex)
    #[serde(deserialize_with = "format::vec3_list")]
    pub normals: Vec<DVec3>,

    /// Texture coordinates (optional, one per vertex)
    #[serde(deserialize_with = "format::vec2_list")]
    pub texcoords: Vec<DVec2>,

    /// Local to parent transform
    #[serde(deserialize_with = "format::matrix")]
    pub matrix: DMat4,

    /// Face groups keyed by material name
    pub materials: BTreeMap<String, MaterialGroup>,

    /// Child objects, transformed by this object's matrix
    pub children: BTreeMap<String, Object>,
}

impl Default for Object {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            matrix: DMat4::IDENTITY,
            materials: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }
}

impl Object {
    /// Number of faces across all material groups.
    pub fn face_count(&self) -> usize {
        self.materials.values().map(|g| g.indices.len()).sum()
    }

    /// Emit world-space triangles for this object.
    ///
    /// `matrix` must already be the absolute transform (see `flatten`).
    /// Ids continue from `next_id`, which is advanced past the new
    /// triangles.
    pub fn triangles(&self, name: &str, next_id: &mut usize) -> SceneResult<Vec<Triangle>> {
        let positions: Vec<DVec3> = self
            .vertices
            .iter()
            .map(|&v| self.matrix.transform_point3(v))
            .collect();
        let normals: Vec<DVec3> = self
            .normals
            .iter()
            .map(|&n| self.matrix.transform_normal(n))
            .collect();

        let mut triangles = Vec::with_capacity(self.face_count());

        for group in self.materials.values() {
            let material = Arc::new(group.material.clone());

            for face in &group.indices {
                if face.len() < 3 {
                    return Err(SceneError::ShortFace {
                        object: name.to_string(),
                        len: face.len(),
                    });
                }

                let mut idx = [0usize; 3];
                for (slot, &raw) in idx.iter_mut().zip(face.iter()) {
                    *slot = usize::try_from(raw)
                        .ok()
                        .filter(|&i| i < positions.len())
                        .ok_or_else(|| SceneError::InvalidFace {
                            object: name.to_string(),
                            index: raw,
                            count: positions.len(),
                        })?;
                }

                let mut triangle = Triangle::new(
                    *next_id,
                    [positions[idx[0]], positions[idx[1]], positions[idx[2]]],
                    material.clone(),
                );

                if normals.len() == positions.len() {
                    let vertex_normals = [normals[idx[0]], normals[idx[1]], normals[idx[2]]];
                    if face.get(3) == Some(&1) {
                        triangle = triangle.with_smooth_normals(vertex_normals);
                    } else {
                        triangle.normals = vertex_normals;
                    }
                }
                if self.texcoords.len() == positions.len() {
                    triangle = triangle.with_tex_coords([
                        self.texcoords[idx[0]],
                        self.texcoords[idx[1]],
                        self.texcoords[idx[2]],
                    ]);
                }

                triangles.push(triangle);
                *next_id += 1;
            }
        }

        Ok(triangles)
    }
}

/// Lift every child into the top-level map with its absolute transform.
///
/// A child's matrix is composed with its parent's (`parent * child`) and the
/// child is renamed `parent/child`. The returned objects have no children.
pub fn flatten(objects: BTreeMap<String, Object>) -> BTreeMap<String, Object> {
    let mut flat = BTreeMap::new();
    for (name, object) in objects {
        flatten_into(name, object, &mut flat);
    }
    flat
}

fn flatten_into(name: String, mut object: Object, flat: &mut BTreeMap<String, Object>) {
    let children = std::mem::take(&mut object.children);
    for (child_name, mut child) in children {
        child.matrix = object.matrix * child.matrix;
        flatten_into(format!("{}/{}", name, child_name), child, flat);
    }
    flat.insert(name, object);
}
