pub mod accumulation;
mod blit;
pub mod error;
pub mod kernel;
pub mod pass;
mod scratch;
pub mod uniforms;

pub use accumulation::BlendMaterial;
pub use error::PassError;
pub use kernel::KernelSource;
pub use pass::{FrameOutcome, FrameReport, FrameTarget, SdfComputePass};
pub use uniforms::FrameUniforms;
