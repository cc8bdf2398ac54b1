use penumbra_core::view::{CameraView, LightSource};

use crate::error::PassError;

/// GPU-uploadable per-frame uniforms (160 bytes). Must match `FrameUniforms`
/// in [`FrameUniforms::WGSL_DECLARATION`]; the field names there are the
/// names the kernel reads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    /// `_CameraToWorld`
    pub camera_to_world: [[f32; 4]; 4],
    /// `_CameraInverseProjection`
    pub camera_inverse_projection: [[f32; 4]; 4],
    /// `_Light`
    pub light: [f32; 3],
    /// `positionLight`: 1 for a positional light, 0 for a directional one.
    pub position_light: u32,
    /// `numShapes`
    pub shape_count: u32,
    pub _padding: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<FrameUniforms>() == 160);

impl FrameUniforms {
    pub const WGSL_DECLARATION: &'static str = "struct FrameUniforms {
    _CameraToWorld: mat4x4<f32>,
    _CameraInverseProjection: mat4x4<f32>,
    _Light: vec3<f32>,
    positionLight: u32,
    numShapes: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}
";

    /// Build the uniforms for one frame. A missing light is a hard failure:
    /// there is no sensible default light vector.
    pub fn new(
        camera: &CameraView,
        light: Option<&LightSource>,
        shape_count: u32,
    ) -> Result<Self, PassError> {
        let light = light.ok_or(PassError::MissingLight)?;
        Ok(Self {
            camera_to_world: camera.camera_to_world.to_cols_array_2d(),
            camera_inverse_projection: camera.inverse_projection().to_cols_array_2d(),
            light: light.kernel_vector().to_array(),
            position_light: light.is_positional() as u32,
            shape_count,
            _padding: [0; 3],
        })
    }
}
