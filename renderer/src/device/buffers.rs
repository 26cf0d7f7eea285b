use super::error::DeviceError;
use super::vertex::Vertex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferId(u32);

// Slots are never reused, so a destroyed id stays stale forever instead
// of silently aliasing a later allocation.
struct Pool<T> {
    slots: Vec<Option<Vec<T>>>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: Copy> Pool<T> {
    fn create(&mut self, data: &[T]) -> Result<u32, DeviceError> {
        if data.is_empty() {
            return Err(DeviceError::EmptyBuffer);
        }
        self.slots.push(Some(data.to_vec()));
        Ok(self.slots.len() as u32 - 1)
    }

    fn data(&self, id: u32) -> Result<&[T], DeviceError> {
        self.slots
            .get(id as usize)
            .and_then(|slot| slot.as_deref())
            .ok_or(DeviceError::StaleHandle)
    }

    fn write(&mut self, id: u32, data: &[T]) -> Result<(), DeviceError> {
        let slot = self
            .slots
            .get_mut(id as usize)
            .and_then(|slot| slot.as_mut())
            .ok_or(DeviceError::StaleHandle)?;
        if slot.len() != data.len() {
            return Err(DeviceError::SizeMismatch {
                allocated: slot.len(),
                supplied: data.len(),
            });
        }
        slot.copy_from_slice(data);
        Ok(())
    }

    fn destroy(&mut self, id: u32) -> Result<(), DeviceError> {
        let slot = self
            .slots
            .get_mut(id as usize)
            .ok_or(DeviceError::StaleHandle)?;
        if slot.is_none() {
            return Err(DeviceError::StaleHandle);
        }
        *slot = None;
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct BufferPool {
    vertex: Pool<Vertex>,
    index: Pool<u32>,
}

impl BufferPool {
    pub fn create_vertex(&mut self, data: &[Vertex]) -> Result<VertexBufferId, DeviceError> {
        self.vertex.create(data).map(VertexBufferId)
    }

    pub fn create_index(&mut self, data: &[u32]) -> Result<IndexBufferId, DeviceError> {
        self.index.create(data).map(IndexBufferId)
    }

    pub fn vertex_data(&self, id: VertexBufferId) -> Result<&[Vertex], DeviceError> {
        self.vertex.data(id.0)
    }

    pub fn index_data(&self, id: IndexBufferId) -> Result<&[u32], DeviceError> {
        self.index.data(id.0)
    }

    pub fn write_vertex(&mut self, id: VertexBufferId, data: &[Vertex]) -> Result<(), DeviceError> {
        self.vertex.write(id.0, data)
    }

    pub fn write_index(&mut self, id: IndexBufferId, data: &[u32]) -> Result<(), DeviceError> {
        self.index.write(id.0, data)
    }

    pub fn destroy_vertex(&mut self, id: VertexBufferId) -> Result<(), DeviceError> {
        self.vertex.destroy(id.0)
    }

    pub fn destroy_index(&mut self, id: IndexBufferId) -> Result<(), DeviceError> {
        self.index.destroy(id.0)
    }
}
