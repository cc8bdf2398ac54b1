use thiserror::Error;

/// Hard failures of a single `SdfComputePass::execute`. An idle pass is not
/// an error and never produces one of these.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("scene has no light source; the kernel light vector cannot be computed")]
    MissingLight,

    #[error("frame target is {width}x{height}; both dimensions must be non-zero")]
    TargetSize { width: u32, height: u32 },

    #[error("frame colour texture is missing required usages {0:?}")]
    MissingTextureUsage(wgpu::TextureUsages),
}
