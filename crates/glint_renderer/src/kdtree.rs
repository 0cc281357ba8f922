//! KD-tree acceleration structure.
//!
//! Triangles are split at the centroid of their midpoints along the longest
//! axis of the node's bounding box. Nodes hold arena indices; the triangles
//! themselves stay in the scene's `Vec<Triangle>`.

use std::collections::HashSet;

use glint_core::Triangle;
use glint_math::{Aabb, Ray, DIFF};

use crate::triangle::{intersect_triangle, TriangleHit};

/// Hard cap on tree depth.
const MAX_DEPTH: usize = 50;

/// A split is abandoned when this share of either side also landed on the
/// other side.
const MAX_OVERLAP_RATIO: f64 = 0.5;

/// Tree node - an internal split or a leaf of triangle indices.
#[derive(Debug, Clone)]
pub enum Node {
    /// Internal node with exactly two children.
    Internal {
        bbox: Aabb,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Leaf node with triangle indices (possibly empty).
    Leaf { bbox: Aabb, triangles: Vec<usize> },
}

impl Node {
    pub fn bbox(&self) -> &Aabb {
        match self {
            Node::Internal { bbox, .. } | Node::Leaf { bbox, .. } => bbox,
        }
    }
}

/// The scene's acceleration structure.
#[derive(Debug, Clone)]
pub struct KdTree {
    root: Node,
}

/// Shape of a built tree, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub internal_nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    pub largest_leaf: usize,
}

impl KdTree {
    /// Build the tree over every triangle in the arena.
    pub fn build(triangles: &[Triangle]) -> Self {
        let indices: Vec<usize> = (0..triangles.len()).collect();
        let root = build_node(triangles, indices, 0);
        let tree = Self { root };

        let stats = tree.stats();
        log::debug!(
            "KD-tree: {} triangles, {} leaves, {} internal nodes, depth {}, largest leaf {}",
            triangles.len(),
            stats.leaves,
            stats.internal_nodes,
            stats.max_depth,
            stats.largest_leaf
        );

        tree
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Bounds of the whole scene.
    pub fn bounds(&self) -> Aabb {
        *self.root.bbox()
    }

    /// Triangle index lists of every leaf, depth-first.
    pub fn leaves(&self) -> Vec<&[usize]> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                Node::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
                Node::Leaf { triangles, .. } => out.push(triangles.as_slice()),
            }
        }
        out
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        let mut stack = vec![(&self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            stats.max_depth = stats.max_depth.max(depth);
            match node {
                Node::Internal { left, right, .. } => {
                    stats.internal_nodes += 1;
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
                Node::Leaf { triangles, .. } => {
                    stats.leaves += 1;
                    stats.largest_leaf = stats.largest_leaf.max(triangles.len());
                }
            }
        }
        stats
    }

    /// Closest hit along the ray.
    ///
    /// `accept` is consulted before a candidate becomes the closest hit;
    /// rejected candidates (e.g. transparent texels) let the traversal keep
    /// looking for the next opaque surface.
    pub fn intersect<F>(&self, triangles: &[Triangle], ray: &Ray, accept: F) -> Option<TriangleHit>
    where
        F: Fn(&Triangle, &TriangleHit) -> bool,
    {
        let mut closest = None;
        intersect_node(&self.root, triangles, ray, &accept, &mut closest);
        closest
    }
}

fn intersect_node<F>(
    node: &Node,
    triangles: &[Triangle],
    ray: &Ray,
    accept: &F,
    closest: &mut Option<TriangleHit>,
) where
    F: Fn(&Triangle, &TriangleHit) -> bool,
{
    if !node.bbox().hit(ray.origin, ray.direction) {
        return;
    }

    match node {
        Node::Internal { left, right, .. } => {
            intersect_node(left, triangles, ray, accept, closest);
            intersect_node(right, triangles, ray, accept, closest);
        }
        Node::Leaf {
            triangles: indices, ..
        } => {
            for &index in indices {
                let triangle = &triangles[index];
                let Some(hit) = intersect_triangle(ray, triangle) else {
                    continue;
                };
                if hit.dist <= DIFF {
                    continue;
                }
                if closest.map_or(false, |c| hit.dist >= c.dist) {
                    continue;
                }
                if accept(triangle, &hit) {
                    *closest = Some(hit);
                }
            }
        }
    }
}

fn build_node(triangles: &[Triangle], indices: Vec<usize>, depth: usize) -> Node {
    let bbox = indices.iter().fold(Aabb::EMPTY, |acc, &i| {
        Aabb::surrounding(&acc, &triangles[i].bounding_box())
    });

    if indices.len() <= 1 {
        return Node::Leaf {
            bbox,
            triangles: indices,
        };
    }

    let centroid = indices
        .iter()
        .fold(glint_math::DVec3::ZERO, |acc, &i| acc + triangles[i].midpoint())
        / indices.len() as f64;
    let axis = bbox.longest_axis();

    let (mut left, mut right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| triangles[i].midpoint()[axis] < centroid[axis]);

    // Unsplittable set: both sides carry everything, and the overlap
    // check below turns the node into a leaf.
    if left.is_empty() {
        left = right.clone();
    }
    if right.is_empty() {
        right = left.clone();
    }

    if depth >= MAX_DEPTH || !split_is_effective(triangles, &left, &right) {
        return Node::Leaf {
            bbox,
            triangles: indices,
        };
    }

    let left = build_node(triangles, left, depth + 1);
    let right = build_node(triangles, right, depth + 1);

    Node::Internal {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Count every triangle present on both sides (by position, so coincident
/// duplicates count too) and require the overlap to stay under
/// `MAX_OVERLAP_RATIO` of each side.
fn split_is_effective(triangles: &[Triangle], left: &[usize], right: &[usize]) -> bool {
    let left_positions: HashSet<[[u64; 3]; 3]> = left
        .iter()
        .map(|&i| position_key(&triangles[i]))
        .collect();

    let matches = right
        .iter()
        .filter(|&&i| left_positions.contains(&position_key(&triangles[i])))
        .count();

    (matches as f64) / (left.len() as f64) < MAX_OVERLAP_RATIO
        && (matches as f64) / (right.len() as f64) < MAX_OVERLAP_RATIO
}

/// Exact vertex positions as hashable bits.
fn position_key(triangle: &Triangle) -> [[u64; 3]; 3] {
    triangle
        .vertices
        .map(|v| [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Material;
    use glint_math::DVec3;
    use std::sync::Arc;

    fn grid(n: usize) -> Vec<Triangle> {
        let material = Arc::new(Material::default());
        let mut triangles = Vec::new();
        for i in 0..n {
            for j in 0..n {
                let base = DVec3::new(i as f64, j as f64, (i * j % 3) as f64);
                triangles.push(Triangle::new(
                    triangles.len(),
                    [base, base + DVec3::X * 0.9, base + DVec3::Y * 0.9],
                    material.clone(),
                ));
            }
        }
        triangles
    }

    fn leaf_indices(tree: &KdTree) -> Vec<usize> {
        let mut all: Vec<usize> = tree.leaves().into_iter().flatten().copied().collect();
        all.sort_unstable();
        all
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::build(&[]);
        assert!(matches!(tree.root(), Node::Leaf { triangles, .. } if triangles.is_empty()));

        let ray = Ray::new(DVec3::ZERO, DVec3::Z);
        assert!(tree.intersect(&[], &ray, |_, _| true).is_none());
    }

    #[test]
    fn test_single_triangle_is_leaf() {
        let triangles = grid(1);
        let tree = KdTree::build(&triangles);
        assert!(matches!(tree.root(), Node::Leaf { .. }));
    }

    #[test]
    fn test_leaves_partition_input() {
        let triangles = grid(12);
        let tree = KdTree::build(&triangles);

        assert!(tree.stats().leaves > 1);
        let expected: Vec<usize> = (0..triangles.len()).collect();
        assert_eq!(leaf_indices(&tree), expected);
    }

    #[test]
    fn test_coincident_triangles_stop_splitting() {
        let material = Arc::new(Material::default());
        let vertices = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let triangles: Vec<Triangle> = (0..20)
            .map(|i| Triangle::new(i, vertices, material.clone()))
            .collect();

        let tree = KdTree::build(&triangles);
        assert!(matches!(tree.root(), Node::Leaf { triangles, .. } if triangles.len() == 20));
        assert_eq!(leaf_indices(&tree), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_intersect_matches_brute_force() {
        let triangles = grid(10);
        let tree = KdTree::build(&triangles);

        for k in 0..40 {
            let origin = DVec3::new(-3.0 + k as f64 * 0.37, 4.5, 10.0);
            let target = DVec3::new(k as f64 * 0.23, 9.0 - k as f64 * 0.21, 0.0);
            let ray = Ray::new(origin, (target - origin).normalize());

            let brute = triangles
                .iter()
                .filter_map(|t| intersect_triangle(&ray, t))
                .min_by(|a, b| a.dist.partial_cmp(&b.dist).unwrap());
            let fast = tree.intersect(&triangles, &ray, |_, _| true);

            assert_eq!(brute.map(|h| h.triangle), fast.map(|h| h.triangle));
            if let (Some(a), Some(b)) = (brute, fast) {
                assert!((a.dist - b.dist).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let triangles = grid(8);
        let a = KdTree::build(&triangles);
        let b = KdTree::build(&triangles);

        let ray = Ray::new(DVec3::new(3.2, 3.1, 10.0), DVec3::NEG_Z);
        let ha = a.intersect(&triangles, &ray, |_, _| true).unwrap();
        let hb = b.intersect(&triangles, &ray, |_, _| true).unwrap();

        assert_eq!(ha.triangle, hb.triangle);
        assert!((ha.dist - hb.dist).abs() < 1e-12);
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_rejected_hit_falls_through() {
        let material = Arc::new(Material::default());
        let near = Triangle::new(
            0,
            [DVec3::new(-1.0, -1.0, 1.0), DVec3::new(1.0, -1.0, 1.0), DVec3::new(0.0, 1.0, 1.0)],
            material.clone(),
        );
        let far = Triangle::new(
            1,
            [DVec3::new(-1.0, -1.0, 0.0), DVec3::new(1.0, -1.0, 0.0), DVec3::new(0.0, 1.0, 0.0)],
            material,
        );
        let triangles = vec![near, far];
        let tree = KdTree::build(&triangles);
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z);

        let hit = tree.intersect(&triangles, &ray, |_, _| true).unwrap();
        assert_eq!(hit.triangle, 0);

        let hit = tree.intersect(&triangles, &ray, |t, _| t.id != 0).unwrap();
        assert_eq!(hit.triangle, 1);
    }
}
