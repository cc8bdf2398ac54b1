use std::cmp;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use penumbra_core::constants::SHAPE_RECORD_BYTES;

use crate::kernel::DESTINATION_FORMAT;
use crate::uniforms::FrameUniforms;

/// Transient GPU resources for one active frame. Every texture and buffer
/// is destroyed when the guard drops, on the success path and on every
/// early return alike.
pub(crate) struct FrameScratch {
    /// Copy of the frame colour, bound as `Source`.
    pub snapshot: wgpu::Texture,
    pub snapshot_view: wgpu::TextureView,
    /// Kernel output, bound as `Destination`.
    pub target: wgpu::Texture,
    pub target_view: wgpu::TextureView,
    pub shape_buffer: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    live: Arc<AtomicUsize>,
}

impl FrameScratch {
    pub(crate) fn acquire(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        shape_bytes: u64,
        live: &Arc<AtomicUsize>,
    ) -> Self {
        let snapshot = create_texture(
            device,
            "sdf-snapshot",
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let target = create_texture(
            device,
            "sdf-target",
            width,
            height,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        );

        // wgpu rejects zero-sized storage bindings; an empty scene still gets one record.
        let shape_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sdf-shapes"),
            size: shape_buffer_size(shape_bytes),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sdf-frame-uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        live.fetch_add(1, Ordering::Relaxed);

        Self {
            snapshot_view: snapshot.create_view(&wgpu::TextureViewDescriptor::default()),
            snapshot,
            target_view: target.create_view(&wgpu::TextureViewDescriptor::default()),
            target,
            shape_buffer,
            uniform_buffer,
            live: Arc::clone(live),
        }
    }
}

impl Drop for FrameScratch {
    fn drop(&mut self) {
        self.snapshot.destroy();
        self.target.destroy();
        self.shape_buffer.destroy();
        self.uniform_buffer.destroy();
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

pub(crate) fn shape_buffer_size(shape_bytes: u64) -> u64 {
    cmp::max(shape_bytes, SHAPE_RECORD_BYTES)
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DESTINATION_FORMAT,
        usage,
        view_formats: &[],
    })
}
