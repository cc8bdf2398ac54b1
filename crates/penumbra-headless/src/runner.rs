use std::time::Instant;

use glam::Vec3;
use penumbra_core::settings::{PassEvent, PassSettings};
use penumbra_core::view::CameraView;
use penumbra_render::{FrameOutcome, FrameTarget, PassError, SdfComputePass};

use crate::error::HeadlessError;
use crate::scenes::SceneConfig;

/// Timing data for a single run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of running one scene for a number of frames.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunResult {
    pub scene_name: String,
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub dispatched_frames: u32,
    pub skipped_frames: u32,
    pub shape_count: u32,
    pub shape_bytes: u64,
    pub workgroups: [u32; 3],
    pub accumulated: bool,
    pub timings: TimingSeries,
}

/// Frame dimensions and count for a run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub width: u32,
    pub height: u32,
    pub frames: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frames: 60,
        }
    }
}

/// Drives the SDF pass on a native device with an offscreen frame target.
pub struct HeadlessRunner {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessRunner {
    /// Initialize wgpu natively. Blocks on the async adapter request. Tries
    /// the primary backends first, then any backend at downlevel limits.
    pub fn new() -> Result<Self, HeadlessError> {
        let (adapter, required_limits) = match request_adapter(wgpu::Backends::PRIMARY) {
            Some(adapter) => (adapter, wgpu::Limits::default()),
            None => {
                log::warn!("No primary-backend adapter; falling back to any backend");
                let adapter = request_adapter(wgpu::Backends::all()).ok_or(HeadlessError::NoAdapter)?;
                let limits = wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits());
                (adapter, limits)
            }
        };

        log::info!("Headless adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("headless-device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))?;

        Ok(Self { device, queue })
    }

    /// Run `scene` for `options.frames` frames on a pass of its own, so no
    /// accumulation carries over from an earlier scene. Each frame clears the
    /// target, walks the pass events in order and executes the pass at its
    /// event, then waits for the GPU so the frame time covers the dispatch.
    pub fn run_scene(
        &self,
        scene: &SceneConfig,
        settings: &PassSettings,
        kernel_wgsl: Option<&str>,
        options: RunOptions,
    ) -> Result<RunResult, HeadlessError> {
        log::info!(
            "Running scene '{}' at {}x{} for {} frames...",
            scene.name,
            options.width,
            options.height,
            options.frames
        );

        if options.width == 0 || options.height == 0 {
            return Err(PassError::TargetSize {
                width: options.width,
                height: options.height,
            }
            .into());
        }

        let mut pass = pass_for_scene(settings, kernel_wgsl);
        let registry = scene.build();
        let camera = CameraView::look_at(
            Vec3::from(scene.camera_position),
            Vec3::from(scene.camera_target),
            60f32.to_radians(),
            options.width as f32 / options.height as f32,
        );
        let texture = frame_texture(&self.device, options.width, options.height);
        let target = FrameTarget::new(&texture);

        let mut frame_times = Vec::with_capacity(options.frames as usize);
        let mut dispatched_frames = 0u32;
        let mut skipped_frames = 0u32;
        let mut last_report = None;

        for _ in 0..options.frames {
            let frame_start = Instant::now();
            self.clear_target(&texture, settings.clear_color);

            for event in PassEvent::ALL {
                if !settings.runs_at(event) {
                    continue;
                }
                match pass.execute(
                    &self.device,
                    &self.queue,
                    &target,
                    &registry,
                    &camera,
                    scene.light.as_ref(),
                )? {
                    FrameOutcome::Dispatched(report) => {
                        dispatched_frames += 1;
                        last_report = Some(report);
                    }
                    FrameOutcome::Skipped => skipped_frames += 1,
                }
            }

            self.device.poll(wgpu::Maintain::Wait);
            frame_times.push(frame_start.elapsed().as_secs_f64() * 1000.0);
        }
        texture.destroy();

        let timings = compute_timings(&frame_times);
        log::info!(
            "  Done: mean={:.2}ms, p95={:.2}ms, dispatched={}, skipped={}",
            timings.mean_ms,
            timings.p95_ms,
            dispatched_frames,
            skipped_frames
        );

        Ok(RunResult {
            scene_name: scene.name.to_string(),
            width: options.width,
            height: options.height,
            frames: options.frames,
            dispatched_frames,
            skipped_frames,
            shape_count: last_report.map_or(0, |r| r.shape_count),
            shape_bytes: last_report.map_or(0, |r| r.shape_bytes),
            workgroups: last_report.map_or([0; 3], |r| r.grid.to_array()),
            accumulated: last_report.is_some_and(|r| r.accumulated),
            timings,
        })
    }

    /// Stand-in for the host's opaque geometry: fill the target with the clear colour.
    fn clear_target(&self, texture: &wgpu::Texture, clear_color: [f32; 4]) {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("headless-clear"),
            });
        {
            let [r, g, b, a] = clear_color.map(f64::from);
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("headless-clear-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn request_adapter(backends: wgpu::Backends) -> Option<wgpu::Adapter> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    });
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
}

fn frame_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("headless-frame"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

/// Fresh pass built from `settings`; Idle when there is no kernel.
pub fn pass_for_scene(settings: &PassSettings, kernel_wgsl: Option<&str>) -> SdfComputePass {
    SdfComputePass::from_settings(settings, kernel_wgsl.map(str::to_owned))
}

/// Compute timing statistics from a list of frame times in milliseconds.
pub fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}
