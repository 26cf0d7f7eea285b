pub mod device;
pub use device::*;

pub mod math_prelude {
    pub use glam::{Mat4, Vec2, Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};
}
