mod bounding_box;
mod buffers;
mod error;
mod framebuffer;
mod frametime;
mod state;
mod vertex;

use bounding_box::BoundingBox;
use buffers::BufferPool;
use state::PipelineState;

pub use buffers::{IndexBufferId, VertexBufferId};
pub use error::DeviceError;
pub use framebuffer::Framebuffer;
pub use frametime::FrameTime;
pub use state::{DirectionalLight, Material, Transform};
pub use vertex::Vertex;

use crate::math_prelude::*;
use itertools::Itertools;
use rayon::prelude::*;

const BLOCK_SIZE: u32 = 64;

#[derive(Debug, Clone)]
struct Fragment {
    depth: f32,
    color: Vec3,
}

impl Fragment {
    // Cleared fragments sit at infinite depth, so any rasterized depth wins.
    fn is_live(&self) -> bool {
        self.depth.is_finite()
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self {
            depth: f32::INFINITY,
            color: Vec3::ZERO,
        }
    }
}

struct FrameBlock {
    bounds: BoundingBox,
    // Indices into the current draw's lit faces.
    faces: Vec<usize>,
    fragments: Vec<Fragment>,
}

impl FrameBlock {
    fn new(bounds: BoundingBox) -> Self {
        let size = (bounds.width() * bounds.height()) as usize;
        Self {
            bounds,
            faces: Vec::with_capacity(128),
            fragments: vec![Fragment::default(); size],
        }
    }

    fn clear(&mut self) {
        self.faces.clear();
        for fragment in self.fragments.iter_mut() {
            fragment.depth = f32::INFINITY;
        }
    }
}

// One triangle after the transform-and-light stage: clip-space positions
// already divided through by w, per-vertex lit colors, screen bounds.
struct LitFace {
    ndc: [Vec3; 3],
    colors: [Vec3; 3],
    bounds: BoundingBox,
}

impl LitFace {
    fn is_in_view(&self) -> bool {
        self.ndc.iter().any(|p| in_unit_cube(*p))
    }
}

struct Barycentric {
    origin: Vec2,
    inv_u: Vec2,
    inv_v: Vec2,
}

impl Barycentric {
    fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let u = b - a;
        let v = c - a;
        let inv_det = 1.0 / (u.x * v.y - v.x * u.y);
        Self {
            origin: Vec2::new(a.x, a.y),
            inv_u: Vec2::new(v.y, -u.y) * inv_det,
            inv_v: Vec2::new(-v.x, u.x) * inv_det,
        }
    }

    fn weights(&self, point: Vec2) -> Vec3 {
        let p = point - self.origin;
        let r1 = self.inv_u.x * p.x + self.inv_v.x * p.y;
        let r2 = self.inv_u.y * p.x + self.inv_v.y * p.y;
        Vec3::new(1.0 - r1 - r2, r1, r2)
    }

    fn contains(weights: Vec3) -> bool {
        weights.x >= 0.0 && weights.y >= 0.0 && weights.z >= 0.0
    }
}

/// A software rendering device with a fixed-function pipeline: transform
/// state, one directional light and one material are set through discrete
/// state calls, then `draw_indexed` runs transform-and-light, block
/// rasterization and resolve over the bound buffers.
pub struct Device {
    framebuffer: Framebuffer,
    blocks: Vec<FrameBlock>,
    blocks_per_row: u32,
    buffers: BufferPool,
    state: PipelineState,
    frame_time: FrameTime,
}

impl Device {
    pub fn new(width: u32, height: u32) -> Result<Self, DeviceError> {
        if width == 0 || height == 0 {
            return Err(DeviceError::InvalidDimensions { width, height });
        }
        let (blocks, blocks_per_row) = build_blocks(width, height);
        log::debug!("created {}x{} software device, {} blocks", width, height, blocks.len());
        Ok(Self {
            framebuffer: Framebuffer::new(width, height),
            blocks,
            blocks_per_row,
            buffers: BufferPool::default(),
            state: PipelineState::default(),
            frame_time: FrameTime::default(),
        })
    }

    /// Rebuilds the render targets. Buffers and pipeline state survive.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        if width == 0 || height == 0 {
            return Err(DeviceError::InvalidDimensions { width, height });
        }
        let (blocks, blocks_per_row) = build_blocks(width, height);
        self.framebuffer = Framebuffer::new(width, height);
        self.blocks = blocks;
        self.blocks_per_row = blocks_per_row;
        log::debug!("device target resized to {}x{}", width, height);
        Ok(())
    }

    pub fn create_vertex_buffer(&mut self, data: &[Vertex]) -> Result<VertexBufferId, DeviceError> {
        self.buffers.create_vertex(data)
    }

    pub fn create_index_buffer(&mut self, data: &[u32]) -> Result<IndexBufferId, DeviceError> {
        self.buffers.create_index(data)
    }

    /// Rewrites an existing buffer in place. The element count must match
    /// the allocation.
    pub fn write_vertex_buffer(
        &mut self,
        id: VertexBufferId,
        data: &[Vertex],
    ) -> Result<(), DeviceError> {
        self.buffers.write_vertex(id, data)
    }

    pub fn write_index_buffer(&mut self, id: IndexBufferId, data: &[u32]) -> Result<(), DeviceError> {
        self.buffers.write_index(id, data)
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> Result<&[Vertex], DeviceError> {
        self.buffers.vertex_data(id)
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> Result<&[u32], DeviceError> {
        self.buffers.index_data(id)
    }

    pub fn destroy_vertex_buffer(&mut self, id: VertexBufferId) -> Result<(), DeviceError> {
        self.buffers.destroy_vertex(id)
    }

    pub fn destroy_index_buffer(&mut self, id: IndexBufferId) -> Result<(), DeviceError> {
        self.buffers.destroy_index(id)
    }

    pub fn set_transform(&mut self, which: Transform, matrix: Mat4) {
        match which {
            Transform::World => self.state.world = matrix,
            Transform::View => self.state.view = matrix,
            Transform::Projection => self.state.projection = matrix,
        }
    }

    pub fn set_light(&mut self, light: DirectionalLight) {
        self.state.light = light;
    }

    pub fn set_material(&mut self, material: Material) {
        self.state.material = material;
    }

    pub fn set_clear_color(&mut self, color: Vec3) {
        self.state.clear_color = color;
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn frame_time(&self) -> &FrameTime {
        &self.frame_time
    }

    pub fn clear(&mut self) {
        let color = self.state.clear_color;
        self.blocks.par_iter_mut().for_each(|block| block.clear());
        self.framebuffer.clear(color);
    }

    /// One indexed triangle-list draw over the bound buffers, covering
    /// `triangle_count` triangles from the start of the index buffer.
    pub fn draw_indexed(
        &mut self,
        vb: VertexBufferId,
        ib: IndexBufferId,
        triangle_count: u32,
    ) -> Result<(), DeviceError> {
        let width = self.framebuffer.width();
        let height = self.framebuffer.height();
        let blocks_per_row = self.blocks_per_row;

        let vertices = self.buffers.vertex_data(vb)?;
        let indices = self.buffers.index_data(ib)?;

        let used = triangle_count as usize * 3;
        if used > indices.len() {
            return Err(DeviceError::DrawRangeExceeded {
                requested: triangle_count,
                available: indices.len() / 3,
            });
        }
        if let Some(&index) = indices[..used].iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(DeviceError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        let world = self.state.world;
        let clip_from_model = self.state.projection * self.state.view * world;
        let light = self.state.light;
        let material = self.state.material;

        // Transform-and-light stage. Clip position and Lambert-lit color
        // per vertex, all three vertices of a triangle together.
        let start = std::time::Instant::now();
        let shade = |index: u32| -> (Vec3, Vec3) {
            let vertex = &vertices[index as usize];
            let clip = clip_from_model * vertex.position.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            let normal = world.transform_vector3(vertex.normal).normalize_or_zero();
            let lambert = normal.dot(-light.direction).max(0.0);
            let color = (material.ambient * light.ambient
                + material.diffuse * light.diffuse * lambert)
                .clamp(Vec3::ZERO, Vec3::ONE);
            (ndc, color)
        };
        let mut faces = Vec::with_capacity(triangle_count as usize);
        indices[..used]
            .par_chunks_exact(3)
            .map(|triangle| {
                let (a, color_a) = shade(triangle[0]);
                let (b, color_b) = shade(triangle[1]);
                let (c, color_c) = shade(triangle[2]);
                LitFace {
                    ndc: [a, b, c],
                    colors: [color_a, color_b, color_c],
                    bounds: face_bounds(a, b, c, width, height),
                }
            })
            .collect_into_vec(&mut faces);
        let geometry_elapsed = start.elapsed();

        // Bin faces into the blocks their bounds touch, then rasterize
        // each block independently.
        let start = std::time::Instant::now();
        let block_count = self.blocks.len();
        for block in self.blocks.iter_mut() {
            block.faces.clear();
        }
        for (face_index, face) in faces.iter().enumerate() {
            if !face.is_in_view() {
                continue;
            }
            for block_index in
                blocks_covering(&face.bounds, blocks_per_row, block_count, width, height)
            {
                self.blocks[block_index].faces.push(face_index);
            }
        }

        self.blocks.par_iter_mut().for_each(|block| {
            for &face_index in &block.faces {
                let face = &faces[face_index];
                let area = match block.bounds.overlap(&face.bounds) {
                    Some(area) => area,
                    None => continue,
                };
                let bary = Barycentric::new(face.ndc[0], face.ndc[1], face.ndc[2]);

                let y_range = area.y()..(area.y() + area.height());
                let x_range = area.x()..(area.x() + area.width());
                for (y, x) in y_range.cartesian_product(x_range) {
                    let (nx, ny) = screen_to_ndc(x, y, width, height);
                    let weights = bary.weights(Vec2::new(nx, ny));
                    if !Barycentric::contains(weights) {
                        continue;
                    }
                    let depth = weights.x * face.ndc[0].z
                        + weights.y * face.ndc[1].z
                        + weights.z * face.ndc[2].z;
                    let local = {
                        let local_x = x - block.bounds.x();
                        let local_y = y - block.bounds.y();
                        (local_x + local_y * block.bounds.width()) as usize
                    };
                    let fragment = &mut block.fragments[local];
                    if depth < fragment.depth {
                        fragment.depth = depth;
                        fragment.color = weights.x * face.colors[0]
                            + weights.y * face.colors[1]
                            + weights.z * face.colors[2];
                    }
                }
            }
        });
        let rasterization_elapsed = start.elapsed();

        // Resolve stage: copy live fragments into the framebuffer.
        let start = std::time::Instant::now();
        let blocks = &self.blocks;
        self.framebuffer
            .color
            .par_iter_mut()
            .zip(self.framebuffer.depth.par_iter_mut())
            .enumerate()
            .for_each(|(index, (color, depth))| {
                let x = index as u32 % width;
                let y = index as u32 / width;
                let block_index =
                    (x / BLOCK_SIZE + (y / BLOCK_SIZE) * blocks_per_row) as usize;
                let block = &blocks[block_index];
                let local_x = x - block.bounds.x();
                let local_y = y - block.bounds.y();
                let fragment =
                    &block.fragments[(local_x + local_y * block.bounds.width()) as usize];
                if fragment.is_live() {
                    *color = fragment.color;
                    *depth = fragment.depth;
                }
            });
        let resolve_elapsed = start.elapsed();

        self.frame_time = FrameTime::new(geometry_elapsed, rasterization_elapsed, resolve_elapsed);
        Ok(())
    }
}

fn build_blocks(width: u32, height: u32) -> (Vec<FrameBlock>, u32) {
    let mut blocks = Vec::new();
    for y in (0..height).step_by(BLOCK_SIZE as usize) {
        for x in (0..width).step_by(BLOCK_SIZE as usize) {
            let w = BLOCK_SIZE.min(width - x);
            let h = BLOCK_SIZE.min(height - y);
            blocks.push(FrameBlock::new(BoundingBox::new(x, y, w, h)));
        }
    }
    let blocks_per_row = width / BLOCK_SIZE + (width % BLOCK_SIZE).min(1);
    (blocks, blocks_per_row)
}

fn in_unit_cube(p: Vec3) -> bool {
    p.x.abs() <= 1.0 && p.y.abs() <= 1.0 && p.z.abs() <= 1.0
}

fn face_bounds(a: Vec3, b: Vec3, c: Vec3, width: u32, height: u32) -> BoundingBox {
    let min_x = a.x.min(b.x).min(c.x);
    let min_y = a.y.min(b.y).min(c.y);
    let max_x = a.x.max(b.x).max(c.x);
    let max_y = a.y.max(b.y).max(c.y);

    let (left, top) = ndc_to_screen(min_x, max_y, width, height);
    let (right, bottom) = ndc_to_screen(max_x, min_y, width, height);

    // Round up by one pixel so the box always covers the triangle edge.
    BoundingBox::new(left, top, right - left + 1, bottom - top + 1)
}

fn blocks_covering(
    bounds: &BoundingBox,
    blocks_per_row: u32,
    block_count: usize,
    width: u32,
    height: u32,
) -> impl Iterator<Item = usize> {
    let left = bounds.x() / BLOCK_SIZE;
    let right = (bounds.x() + bounds.width() - 1).min(width - 1) / BLOCK_SIZE;
    let top = bounds.y() / BLOCK_SIZE;
    let bottom = (bounds.y() + bounds.height() - 1).min(height - 1) / BLOCK_SIZE;

    (top..=bottom)
        .cartesian_product(left..=right)
        .map(move |(y, x)| ((x + y * blocks_per_row) as usize).min(block_count - 1))
}

fn ndc_to_screen(x: f32, y: f32, width: u32, height: u32) -> (u32, u32) {
    let x = (x + 1.0) / 2.0;
    let y = (-y + 1.0) / 2.0;
    let screen_x = ((x * width as f32) as u32).min(width - 1);
    let screen_y = ((y * height as f32) as u32).min(height - 1);
    (screen_x, screen_y)
}

fn screen_to_ndc(x: u32, y: u32, width: u32, height: u32) -> (f32, f32) {
    let nx = (x as f32 / width as f32) * 2.0 - 1.0;
    let ny = -((y as f32 / height as f32) * 2.0 - 1.0);
    (nx, ny)
}
