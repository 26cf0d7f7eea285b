use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("render target dimensions {width}x{height} are invalid")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("refusing to allocate a zero-length buffer")]
    EmptyBuffer,
    #[error("buffer handle is stale or was never allocated")]
    StaleHandle,
    #[error("buffer holds {allocated} elements, rewrite supplied {supplied}")]
    SizeMismatch { allocated: usize, supplied: usize },
    #[error("index value {index} is out of range for a buffer of {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("draw of {requested} triangles exceeds the {available} indexed by the bound buffer")]
    DrawRangeExceeded { requested: u32, available: usize },
}
