use crate::math_prelude::*;

pub struct Framebuffer {
    width: u32,
    height: u32,
    pub(super) color: Vec<Vec3>,
    pub(super) depth: Vec<f32>,
}

impl Framebuffer {
    pub(super) fn new(width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![Vec3::ZERO; size],
            depth: vec![f32::INFINITY; size],
        }
    }

    pub(super) fn clear(&mut self, color: Vec3) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color values in row-major order, top-left first.
    pub fn colors(&self) -> impl Iterator<Item = &Vec3> {
        self.color.iter()
    }

    pub fn get_color(&self, x: u32, y: u32) -> Option<&Vec3> {
        self.index_of(x, y).and_then(|index| self.color.get(index))
    }

    pub fn get_depth(&self, x: u32, y: u32) -> Option<&f32> {
        self.index_of(x, y).and_then(|index| self.depth.get(index))
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((x + y * self.width) as usize)
        } else {
            None
        }
    }
}
