use std::sync::atomic::{AtomicU64, Ordering};

use renderer::math_prelude::*;
use renderer::Vertex;

/// Process-unique identity of a mesh, the key the geometry cache uploads
/// under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        MeshId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Triangle soup as loaded from file: three private vertices per
/// triangle, indices strictly sequential. `indices.len() == 3 *
/// triangle_count == vertices.len()` always holds.
pub struct Mesh {
    id: MeshId,
    revision: u64,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    triangle_count: u32,
}

impl Mesh {
    pub(crate) fn new(vertices: Vec<Vertex>, indices: Vec<u32>, triangle_count: u32) -> Self {
        debug_assert_eq!(indices.len(), triangle_count as usize * 3);
        debug_assert_eq!(vertices.len(), indices.len());
        Self {
            id: MeshId::next(),
            revision: 0,
            vertices,
            indices,
            triangle_count,
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Bumped by every mutation; stale cached uploads compare against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> u32 {
        self.triangle_count
    }

    /// Axis-aligned bounds over all vertex positions.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for vertex in &self.vertices {
            min = min.min(vertex.position);
            max = max.max(vertex.position);
        }
        (min, max)
    }

    /// Bakes a transform into every vertex. Normals are rotated and
    /// renormalized, positions transformed as points.
    pub fn apply_transform(&mut self, transform: Mat4) {
        for vertex in self.vertices.iter_mut() {
            vertex.position = transform.transform_point3(vertex.position);
            vertex.normal = transform.transform_vector3(vertex.normal).normalize_or_zero();
        }
        self.revision += 1;
    }

    /// Transform that centers the mesh on the origin and scales its
    /// longest extent to `extent`.
    pub fn fit_transform(&self, extent: f32) -> Mat4 {
        let (min, max) = self.bounds();
        let center = (min + max) * 0.5;
        let longest = (max - min).max_element();
        let scale = if longest > 0.0 { extent / longest } else { 1.0 };
        Mat4::from_scale(Vec3::splat(scale)) * Mat4::from_translation(-center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri_mesh() -> Mesh {
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 4.0, 0.0),
        ];
        let vertices = corners.iter().map(|&p| Vertex::new(p, normal)).collect();
        Mesh::new(vertices, vec![0, 1, 2], 1)
    }

    #[test]
    fn ids_are_unique_per_mesh() {
        assert_ne!(tri_mesh().id(), tri_mesh().id());
    }

    #[test]
    fn apply_transform_moves_vertices_and_bumps_the_revision() {
        let mut mesh = tri_mesh();
        assert_eq!(mesh.revision(), 0);

        mesh.apply_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(mesh.revision(), 1);
        assert_eq!(mesh.vertices()[0].position, Vec3::new(1.0, 0.0, 0.0));
        // Translation leaves normals alone.
        assert_eq!(mesh.vertices()[0].normal, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn fit_transform_centers_and_scales_to_the_longest_extent() {
        let mut mesh = tri_mesh();
        let fit = mesh.fit_transform(2.0);
        mesh.apply_transform(fit);

        let (min, max) = mesh.bounds();
        assert!((min + max).length() < 1e-5);
        assert!(((max - min).max_element() - 2.0).abs() < 1e-5);
    }
}
