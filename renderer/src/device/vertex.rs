use crate::math_prelude::*;

/// The device's one and only vertex layout: position plus normal, both
/// single precision. Lighting output is computed by the pipeline, not
/// carried by the vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}
