use std::collections::HashMap;

use renderer::{Device, DeviceError, IndexBufferId, VertexBufferId};

use crate::mesh::{Mesh, MeshId};

struct CachedGeometry {
    revision: u64,
    vertex_buffer: VertexBufferId,
    index_buffer: IndexBufferId,
    vertex_count: usize,
    index_count: usize,
}

/// Device-buffer cache keyed on mesh identity. Geometry is uploaded on
/// first sight and re-uploaded only when the mesh revision moves, instead
/// of reallocating both buffers every frame.
#[derive(Default)]
pub struct GeometryCache {
    entries: HashMap<MeshId, CachedGeometry>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare(
        &mut self,
        device: &mut Device,
        mesh: &Mesh,
    ) -> Result<(VertexBufferId, IndexBufferId), DeviceError> {
        if let Some(entry) = self.entries.get_mut(&mesh.id()) {
            if entry.revision == mesh.revision() {
                return Ok((entry.vertex_buffer, entry.index_buffer));
            }
            if entry.vertex_count == mesh.vertices().len()
                && entry.index_count == mesh.indices().len()
            {
                device.write_vertex_buffer(entry.vertex_buffer, mesh.vertices())?;
                device.write_index_buffer(entry.index_buffer, mesh.indices())?;
                entry.revision = mesh.revision();
                log::debug!(
                    "re-uploaded mesh {:?} at revision {}",
                    mesh.id(),
                    mesh.revision()
                );
                return Ok((entry.vertex_buffer, entry.index_buffer));
            }
        }
        // Either never seen, or the mesh changed size and the old
        // allocations cannot be reused.
        if let Some(stale) = self.entries.remove(&mesh.id()) {
            device.destroy_vertex_buffer(stale.vertex_buffer)?;
            device.destroy_index_buffer(stale.index_buffer)?;
        }

        let vertex_buffer = device.create_vertex_buffer(mesh.vertices())?;
        let index_buffer = device.create_index_buffer(mesh.indices())?;
        log::debug!(
            "uploaded mesh {:?}: {} vertices, {} indices",
            mesh.id(),
            mesh.vertices().len(),
            mesh.indices().len()
        );
        self.entries.insert(
            mesh.id(),
            CachedGeometry {
                revision: mesh.revision(),
                vertex_buffer,
                index_buffer,
                vertex_count: mesh.vertices().len(),
                index_count: mesh.indices().len(),
            },
        );
        Ok((vertex_buffer, index_buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use renderer::math_prelude::*;
    use renderer::Vertex;

    fn triangle_mesh() -> Mesh {
        let normal = Vec3::new(0.0, 0.0, -1.0);
        let vertices = vec![
            Vertex::new(Vec3::new(-1.0, -1.0, 0.0), normal),
            Vertex::new(Vec3::new(1.0, -1.0, 0.0), normal),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0), normal),
        ];
        Mesh::new(vertices, vec![0, 1, 2], 1)
    }

    #[test]
    fn unchanged_meshes_keep_their_handles() {
        let mut device = Device::new(64, 64).unwrap();
        let mut cache = GeometryCache::new();
        let mesh = triangle_mesh();

        let first = cache.prepare(&mut device, &mesh).unwrap();
        let second = cache.prepare(&mut device, &mesh).unwrap();
        assert_eq!(first, second);
        assert_eq!(device.vertex_buffer(first.0).unwrap().len(), 3);
    }

    #[test]
    fn a_bumped_revision_rewrites_the_buffers_in_place() {
        let mut device = Device::new(64, 64).unwrap();
        let mut cache = GeometryCache::new();
        let mut mesh = triangle_mesh();

        let (vb, ib) = cache.prepare(&mut device, &mesh).unwrap();
        mesh.apply_transform(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        let (vb_after, ib_after) = cache.prepare(&mut device, &mesh).unwrap();

        assert_eq!((vb, ib), (vb_after, ib_after));
        let uploaded = device.vertex_buffer(vb).unwrap();
        assert_eq!(uploaded[0].position, Vec3::new(4.0, -1.0, 0.0));
    }

    #[test]
    fn distinct_meshes_get_distinct_buffers() {
        let mut device = Device::new(64, 64).unwrap();
        let mut cache = GeometryCache::new();
        let first = triangle_mesh();
        let second = triangle_mesh();

        let (vb_first, _) = cache.prepare(&mut device, &first).unwrap();
        let (vb_second, _) = cache.prepare(&mut device, &second).unwrap();
        assert_ne!(vb_first, vb_second);
    }
}
