//! The per-frame SDF compute pass.
//!
//! Two states only: Idle (no kernel, every `execute` is a no-op) and Active
//! (kernel configured, the full snapshot / dispatch / composite sequence runs
//! each frame).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use penumbra_core::flatten::flatten_scene;
use penumbra_core::math::DispatchGrid;
use penumbra_core::record::PackedShapes;
use penumbra_core::scene::PrimitiveRegistry;
use penumbra_core::settings::PassSettings;
use penumbra_core::view::{CameraView, LightSource};

use crate::accumulation::{Accumulator, BlendMaterial};
use crate::blit::Blitter;
use crate::error::PassError;
use crate::kernel::{CompiledKernel, KernelSource};
use crate::scratch::FrameScratch;
use crate::uniforms::FrameUniforms;

/// Usages the frame colour texture needs: it is read into the snapshot and
/// written by the final composite.
pub const REQUIRED_TARGET_USAGES: wgpu::TextureUsages =
    wgpu::TextureUsages::TEXTURE_BINDING.union(wgpu::TextureUsages::RENDER_ATTACHMENT);

/// The colour buffer a frame renders into. Its size is always the
/// texture's own size; scratch surfaces and the grid follow it.
#[derive(Debug, Clone, Copy)]
pub struct FrameTarget<'a> {
    color: &'a wgpu::Texture,
    width: u32,
    height: u32,
}

impl<'a> FrameTarget<'a> {
    pub fn new(color: &'a wgpu::Texture) -> Self {
        Self {
            color,
            width: color.width(),
            height: color.height(),
        }
    }

    pub fn color(&self) -> &'a wgpu::Texture {
        self.color
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn validate(&self) -> Result<(), PassError> {
        if self.width == 0 || self.height == 0 {
            return Err(PassError::TargetSize {
                width: self.width,
                height: self.height,
            });
        }
        let missing = REQUIRED_TARGET_USAGES.difference(self.color.usage());
        if !missing.is_empty() {
            return Err(PassError::MissingTextureUsage(missing));
        }
        Ok(())
    }
}

/// What a single `execute` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Idle pass, frame target untouched.
    Skipped,
    Dispatched(FrameReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub grid: DispatchGrid,
    pub shape_count: u32,
    pub shape_bytes: u64,
    /// Composited through the blend material.
    pub accumulated: bool,
}

enum PassState {
    Idle,
    Active(ActiveKernel),
}

struct ActiveKernel {
    source: KernelSource,
    material: Option<BlendMaterial>,
    /// Built on the first active frame.
    compiled: Option<CompiledKernel>,
    accumulator: Option<Accumulator>,
}

pub struct SdfComputePass {
    state: PassState,
    blitter: Option<Blitter>,
    live_scratch: Arc<AtomicUsize>,
}

impl Default for SdfComputePass {
    fn default() -> Self {
        Self::new()
    }
}

impl SdfComputePass {
    /// A new pass starts Idle.
    pub fn new() -> Self {
        Self {
            state: PassState::Idle,
            blitter: None,
            live_scratch: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Build a pass from settings. `kernel_wgsl` is the already-loaded kernel
    /// body; `None` leaves the pass Idle.
    pub fn from_settings(settings: &PassSettings, kernel_wgsl: Option<String>) -> Self {
        let mut pass = Self::new();
        let kernel = kernel_wgsl.map(|wgsl| {
            KernelSource::new(settings.label.clone(), wgsl).with_entry_point(settings.kernel_entry_point.clone())
        });
        let material = settings.accumulate.then(BlendMaterial::additive);
        pass.configure(kernel, material);
        pass
    }

    /// Assign or clear the kernel. Pipelines are compiled lazily on the next
    /// active frame; an existing accumulation surface is discarded.
    pub fn configure(&mut self, kernel: Option<KernelSource>, material: Option<BlendMaterial>) {
        match kernel {
            Some(source) => {
                log::info!(
                    "SDF pass active: kernel '{}'{}",
                    source.label(),
                    material
                        .as_ref()
                        .map(|m| format!(", blend material '{}'", m.label()))
                        .unwrap_or_default()
                );
                self.state = PassState::Active(ActiveKernel {
                    source,
                    material,
                    compiled: None,
                    accumulator: None,
                });
            }
            None => {
                if let Some(material) = material {
                    log::warn!(
                        "Blend material '{}' ignored: no kernel configured",
                        material.label()
                    );
                }
                self.clear();
            }
        }
    }

    /// Back to Idle. Drops the kernel, the material and the accumulation surface.
    pub fn clear(&mut self) {
        if self.is_active() {
            log::info!("SDF pass idle");
        }
        self.state = PassState::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PassState::Active(_))
    }

    pub fn kernel(&self) -> Option<&KernelSource> {
        match &self.state {
            PassState::Active(active) => Some(&active.source),
            PassState::Idle => None,
        }
    }

    pub fn blend_material(&self) -> Option<&BlendMaterial> {
        match &self.state {
            PassState::Active(active) => active.material.as_ref(),
            PassState::Idle => None,
        }
    }

    /// Per-frame scratch sets currently alive. Zero between frames.
    pub fn live_scratch(&self) -> usize {
        self.live_scratch.load(Ordering::Relaxed)
    }

    /// Run one frame. Records everything into a single encoder, submits it
    /// and returns without waiting for the GPU.
    pub fn execute(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &FrameTarget<'_>,
        registry: &dyn PrimitiveRegistry,
        camera: &CameraView,
        light: Option<&LightSource>,
    ) -> Result<FrameOutcome, PassError> {
        let PassState::Active(ActiveKernel {
            source,
            material,
            compiled,
            accumulator,
        }) = &mut self.state
        else {
            return Ok(FrameOutcome::Skipped);
        };
        target.validate()?;

        let shapes = flatten_scene(registry);
        let packed = PackedShapes::pack(&shapes);
        let scratch = FrameScratch::acquire(
            device,
            target.width,
            target.height,
            packed.byte_len(),
            &self.live_scratch,
        );

        let uniforms = FrameUniforms::new(camera, light, packed.shape_count())?;
        queue.write_buffer(&scratch.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        if !packed.is_empty() {
            queue.write_buffer(&scratch.shape_buffer, 0, packed.as_bytes());
        }

        let kernel = compiled.get_or_insert_with(|| CompiledKernel::compile(device, source));
        let blitter = self.blitter.get_or_insert_with(|| Blitter::new(device));
        let color_view = target.color.create_view(&wgpu::TextureViewDescriptor::default());
        let grid = DispatchGrid::for_target(target.width, target.height);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sdf-pass-encoder"),
        });

        // 1. Snapshot the current colour so the kernel can read it.
        blitter.copy(
            device,
            &mut encoder,
            &color_view,
            &scratch.snapshot_view,
            scratch.snapshot.format(),
        );

        // 2. Kernel dispatch
        {
            let bind_group = kernel.bind_group(device, &scratch);
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("sdf-kernel-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(kernel.pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(grid.x, grid.y, grid.z);
        }

        // 3. Composite
        let accumulated = match material {
            Some(material) => {
                let accumulator = accumulator.get_or_insert_with(|| Accumulator::new(device, material));
                let surface = accumulator.accumulate(
                    device,
                    &mut encoder,
                    &scratch.target_view,
                    target.width,
                    target.height,
                );
                blitter.copy(device, &mut encoder, surface, &color_view, target.color.format());
                true
            }
            None => {
                blitter.copy(
                    device,
                    &mut encoder,
                    &scratch.target_view,
                    &color_view,
                    target.color.format(),
                );
                false
            }
        };

        queue.submit(std::iter::once(encoder.finish()));
        drop(scratch);

        let report = FrameReport {
            grid,
            shape_count: packed.shape_count(),
            shape_bytes: packed.byte_len(),
            accumulated,
        };
        log::debug!(
            "SDF pass: {} shapes ({} bytes), grid {:?}, accumulated={}",
            report.shape_count,
            report.shape_bytes,
            report.grid.to_array(),
            report.accumulated
        );
        Ok(FrameOutcome::Dispatched(report))
    }
}
