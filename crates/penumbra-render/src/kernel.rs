use penumbra_core::constants::{DEFAULT_KERNEL_ENTRY_POINT, DESTINATION_FORMAT_WGSL, THREAD_GROUP_SIZE};
use penumbra_core::record::ShapeRecord;

use crate::scratch::FrameScratch;
use crate::uniforms::FrameUniforms;

/// Storage format of the kernel's `Destination` texture.
pub const DESTINATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Binding slots in group 0. Mirrored in [`binding_preamble`].
pub const BINDING_FRAME: u32 = 0;
pub const BINDING_SHAPES: u32 = 1;
pub const BINDING_SOURCE: u32 = 2;
pub const BINDING_DESTINATION: u32 = 3;

/// Bundled smoke-test kernel.
const PASSTHROUGH_WGSL: &str = include_str!("../../../shaders/kernels/passthrough.wgsl");

/// WGSL compute kernel supplied by the host. The source is the kernel body
/// only; the binding preamble is prepended at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSource {
    label: String,
    wgsl: String,
    entry_point: String,
}

impl KernelSource {
    pub fn new(label: impl Into<String>, wgsl: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            wgsl: wgsl.into(),
            entry_point: DEFAULT_KERNEL_ENTRY_POINT.into(),
        }
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Kernel that copies `Source` and tints it towards the first shape.
    pub fn passthrough() -> Self {
        Self::new("passthrough-kernel", PASSTHROUGH_WGSL)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Preamble followed by the kernel body: what actually gets compiled.
    pub fn composed_source(&self) -> String {
        format!("{}\n{}", binding_preamble(), self.wgsl)
    }
}

/// WGSL declarations every kernel compiles against: the thread group size,
/// the `Shape` record, the `FrameUniforms` block and the four bindings.
/// Generated from the Rust types so host and kernel share one layout.
pub fn binding_preamble() -> String {
    format!(
        "const THREAD_GROUP_SIZE: u32 = {THREAD_GROUP_SIZE}u;\n\n\
         {shape}\n\
         {uniforms}\n\
         @group(0) @binding({BINDING_FRAME}) var<uniform> frame: FrameUniforms;\n\
         @group(0) @binding({BINDING_SHAPES}) var<storage, read> shapes: array<Shape>;\n\
         @group(0) @binding({BINDING_SOURCE}) var Source: texture_2d<f32>;\n\
         @group(0) @binding({BINDING_DESTINATION}) var Destination: texture_storage_2d<{DESTINATION_FORMAT_WGSL}, write>;\n",
        shape = ShapeRecord::WGSL_DECLARATION,
        uniforms = FrameUniforms::WGSL_DECLARATION,
    )
}

/// Compute pipeline built from a [`KernelSource`]. Compiled lazily on the
/// first active frame and kept until the pass is reconfigured.
pub(crate) struct CompiledKernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl CompiledKernel {
    pub(crate) fn compile(device: &wgpu::Device, source: &KernelSource) -> Self {
        log::info!(
            "Compiling kernel '{}' (entry point {})",
            source.label(),
            source.entry_point()
        );

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label()),
            source: wgpu::ShaderSource::Wgsl(source.composed_source().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf-kernel-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: BINDING_FRAME,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: BINDING_SHAPES,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: BINDING_SOURCE,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: BINDING_DESTINATION,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: DESTINATION_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf-kernel-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("sdf-kernel-pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(source.entry_point()),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    pub(crate) fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    /// Bind this frame's scratch: uniforms, shapes, snapshot as `Source`,
    /// write target as `Destination`.
    pub(crate) fn bind_group(&self, device: &wgpu::Device, scratch: &FrameScratch) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf-kernel-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: BINDING_FRAME,
                    resource: scratch.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: BINDING_SHAPES,
                    resource: scratch.shape_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: BINDING_SOURCE,
                    resource: wgpu::BindingResource::TextureView(&scratch.snapshot_view),
                },
                wgpu::BindGroupEntry {
                    binding: BINDING_DESTINATION,
                    resource: wgpu::BindingResource::TextureView(&scratch.target_view),
                },
            ],
        })
    }
}
