use glam::{Mat4, Vec3};

/// Scene light as the kernel understands it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    /// Infinitely distant light shining along `forward`.
    Directional { forward: Vec3 },
    /// Point light at a world position.
    Positional { position: Vec3 },
}

impl LightSource {
    /// Value bound to `_Light`: the forward direction for a directional
    /// light, the world position otherwise.
    pub fn kernel_vector(&self) -> Vec3 {
        match *self {
            LightSource::Directional { forward } => forward,
            LightSource::Positional { position } => position,
        }
    }

    /// Value bound to `positionLight`.
    pub fn is_positional(&self) -> bool {
        matches!(self, LightSource::Positional { .. })
    }
}

/// Camera transforms for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// Camera space (right-handed, looking down -Z) to world space.
    pub camera_to_world: Mat4,
    /// Must be invertible.
    pub projection: Mat4,
}

impl CameraView {
    pub fn new(camera_to_world: Mat4, projection: Mat4) -> Self {
        Self {
            camera_to_world,
            projection,
        }
    }

    /// Perspective camera at `eye` looking at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, fov_y_rad: f32, aspect: f32) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        Self {
            camera_to_world: view.inverse(),
            projection: Mat4::perspective_rh(fov_y_rad, aspect, 0.1, 500.0),
        }
    }

    pub fn inverse_projection(&self) -> Mat4 {
        self.projection.inverse()
    }

    pub fn eye_position(&self) -> Vec3 {
        self.camera_to_world.transform_point3(Vec3::ZERO)
    }
}
