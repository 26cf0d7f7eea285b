use crate::math_prelude::*;

/// Which transform-state slot a `set_transform` call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    World,
    View,
    Projection,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    /// Direction the light travels, expected normalized.
    pub direction: Vec3,
    pub diffuse: Vec3,
    pub ambient: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -1.0, 0.0),
            diffuse: Vec3::ONE,
            ambient: Vec3::splat(0.1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub diffuse: Vec3,
    pub ambient: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Vec3::ONE,
            ambient: Vec3::ONE,
        }
    }
}

pub(super) struct PipelineState {
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub light: DirectionalLight,
    pub material: Material,
    pub clear_color: Vec3,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            light: DirectionalLight::default(),
            material: Material::default(),
            clear_color: Vec3::ZERO,
        }
    }
}
