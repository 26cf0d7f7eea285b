use std::time::Duration;

/// Per-stage timings of the last indexed draw.
#[derive(Debug, Default, Clone)]
pub struct FrameTime {
    geometry: Duration,
    rasterization: Duration,
    resolve: Duration,
}

impl FrameTime {
    pub(super) fn new(geometry: Duration, rasterization: Duration, resolve: Duration) -> Self {
        Self {
            geometry,
            rasterization,
            resolve,
        }
    }

    pub fn geometry_stage(&self) -> &Duration {
        &self.geometry
    }

    pub fn rasterization_stage(&self) -> &Duration {
        &self.rasterization
    }

    pub fn resolve_stage(&self) -> &Duration {
        &self.resolve
    }

    pub fn total(&self) -> Duration {
        self.geometry + self.rasterization + self.resolve
    }
}
