//! Single source of truth for values shared between Rust and the WGSL kernel.
//! The render crate injects these into the kernel preamble; changing one here
//! changes both sides together.

/// Side length of the kernel's square thread group (8x8x1).
pub const THREAD_GROUP_SIZE: u32 = 8;

/// Byte size of one packed shape record: 10 f32 + 3 i32.
pub const SHAPE_RECORD_BYTES: u64 = 52;

/// Multiplier applied to `blend_strength` before packing. The kernel expects
/// the stored value in [0, 3].
pub const BLEND_STRENGTH_SCALE: f32 = 3.0;

/// Kernel entry point used when settings do not name one.
pub const DEFAULT_KERNEL_ENTRY_POINT: &str = "CSMain";

/// Pixel format of the kernel's `Destination` storage texture.
pub const DESTINATION_FORMAT_WGSL: &str = "rgba8unorm";
