use renderer::math_prelude::*;
use renderer::{Device, DeviceError, DirectionalLight, Material, Transform};

use crate::camera::Camera;
use crate::geometry::GeometryCache;
use crate::mesh::Mesh;

/// The one fixed scene of the playground: a mesh at the origin, a static
/// camera, a single directional light and one material.
pub struct Scene {
    pub mesh: Mesh,
    pub camera: Camera,
    pub light: DirectionalLight,
    pub material: Material,
    pub clear_color: Vec3,
}

impl Scene {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            camera: Camera::default(),
            light: DirectionalLight {
                direction: Vec3::new(-0.4, -1.0, 0.6).normalize(),
                diffuse: Vec3::ONE,
                ambient: Vec3::splat(0.15),
            },
            material: Material {
                diffuse: Vec3::new(0.75, 0.75, 0.8),
                ambient: Vec3::new(0.75, 0.75, 0.8),
            },
            clear_color: Vec3::new(0.0, 0.0, 0.15),
        }
    }

    /// Issues the per-frame sequence: clear, transform/light/material
    /// state, geometry through the cache, one indexed draw. Presentation
    /// stays with the window loop.
    pub fn render(
        &self,
        device: &mut Device,
        cache: &mut GeometryCache,
        aspect: f32,
    ) -> Result<(), DeviceError> {
        device.set_clear_color(self.clear_color);
        device.clear();

        device.set_transform(Transform::World, Mat4::IDENTITY);
        device.set_transform(Transform::View, self.camera.view_matrix());
        device.set_transform(Transform::Projection, self.camera.projection_matrix(aspect));
        device.set_light(self.light);
        device.set_material(self.material);

        let (vb, ib) = cache.prepare(device, &self.mesh)?;
        device.draw_indexed(vb, ib, self.mesh.triangle_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::Vertex;

    #[test]
    fn a_facing_triangle_reaches_the_framebuffer() {
        let normal = Vec3::new(0.0, 0.0, -1.0);
        let vertices = vec![
            Vertex::new(Vec3::new(-2.0, -2.0, 0.0), normal),
            Vertex::new(Vec3::new(2.0, -2.0, 0.0), normal),
            Vertex::new(Vec3::new(0.0, 2.0, 0.0), normal),
        ];
        let mesh = Mesh::new(vertices, vec![0, 1, 2], 1);

        let mut scene = Scene::new(mesh);
        scene.camera.eye = Vec3::new(0.0, 0.0, -6.0);

        let mut device = Device::new(64, 64).unwrap();
        let mut cache = GeometryCache::new();
        scene.render(&mut device, &mut cache, 1.0).unwrap();

        let touched = device
            .framebuffer()
            .colors()
            .filter(|&&color| color != scene.clear_color)
            .count();
        assert!(touched > 0, "triangle never rasterized");
    }
}
