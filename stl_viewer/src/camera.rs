use glam::{Mat4, Vec3};

/// Static camera: a fixed eye/focus/up triple plus perspective
/// parameters. Only the aspect ratio varies, following window resizes.
pub struct Camera {
    pub eye: Vec3,
    pub focus: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 3.0, -5.0),
            focus: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45.0f32.to_radians(),
            near: 1.0,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.focus, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }
}
