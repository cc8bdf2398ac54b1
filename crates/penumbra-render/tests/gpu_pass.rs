//! Device-backed checks of the compute pass. Run with
//! `--features gpu_tests`; each test returns early when no adapter exists.
#![cfg(feature = "gpu_tests")]

use glam::Vec3;
use penumbra_core::scene::{SceneGraph, Transform};
use penumbra_core::shape::{Operation, Shape, ShapeKind};
use penumbra_core::view::{CameraView, LightSource};
use penumbra_render::{BlendMaterial, FrameOutcome, FrameTarget, KernelSource, PassError, SdfComputePass};

const SIZE: u32 = 64;
const ROW_BYTES: u32 = SIZE * 4;

/// Prefers a primary backend; falls back to any adapter (GL included) with
/// downlevel limits so the assertions still run on software rasterisers.
fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let device = request_device(wgpu::Backends::PRIMARY).or_else(|| request_device(wgpu::Backends::all()));
    if device.is_none() {
        eprintln!("skipping: no wgpu adapter available");
    }
    device
}

fn request_device(backends: wgpu::Backends) -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("gpu-test-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::Performance,
        },
        None,
    ))
    .ok()
}

fn frame_texture(device: &wgpu::Device, queue: &wgpu::Queue, fill: [u8; 4]) -> wgpu::Texture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("gpu-test-frame"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let pixels: Vec<u8> = fill.iter().copied().cycle().take((SIZE * SIZE * 4) as usize).collect();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(ROW_BYTES),
            rows_per_image: Some(SIZE),
        },
        texture.size(),
    );
    texture
}

fn read_back(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Vec<u8> {
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("gpu-test-readback"),
        size: (ROW_BYTES * SIZE) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(ROW_BYTES),
                rows_per_image: Some(SIZE),
            },
        },
        texture.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().expect("map callback").expect("map failed");
    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    bytes
}

fn camera() -> CameraView {
    CameraView::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0, 1.0)
}

fn light() -> LightSource {
    LightSource::Directional {
        forward: Vec3::new(0.0, -1.0, 0.0),
    }
}

fn red_sphere_scene() -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene.spawn_shape(
        "sphere",
        Transform::default(),
        Shape::new(ShapeKind::Sphere, Operation::None).with_colour([1.0, 0.0, 0.0]),
    );
    scene
}

#[test]
fn test_idle_pass_leaves_frame_untouched() {
    let Some((device, queue)) = device() else {
        return;
    };
    let texture = frame_texture(&device, &queue, [10, 20, 30, 255]);
    let before = read_back(&device, &queue, &texture);

    let mut pass = SdfComputePass::new();
    let outcome = pass
        .execute(
            &device,
            &queue,
            &FrameTarget::new(&texture),
            &red_sphere_scene(),
            &camera(),
            Some(&light()),
        )
        .expect("idle execute");

    assert_eq!(outcome, FrameOutcome::Skipped);
    assert_eq!(pass.live_scratch(), 0);
    assert_eq!(read_back(&device, &queue, &texture), before);
}

#[test]
fn test_passthrough_tints_towards_first_shape() {
    let Some((device, queue)) = device() else {
        return;
    };
    let texture = frame_texture(&device, &queue, [0, 0, 0, 255]);
    let mut pass = SdfComputePass::new();
    pass.configure(Some(KernelSource::passthrough()), None);

    let outcome = pass
        .execute(
            &device,
            &queue,
            &FrameTarget::new(&texture),
            &red_sphere_scene(),
            &camera(),
            Some(&light()),
        )
        .expect("active execute");
    let FrameOutcome::Dispatched(report) = outcome else {
        panic!("expected a dispatch, got {outcome:?}");
    };
    assert_eq!(report.grid.to_array(), [8, 8, 1]);
    assert_eq!(report.shape_count, 1);
    assert_eq!(report.shape_bytes, 52);
    assert!(!report.accumulated);
    assert_eq!(pass.live_scratch(), 0);

    let pixels = read_back(&device, &queue, &texture);
    for texel in pixels.chunks_exact(4) {
        assert!((126..=129).contains(&texel[0]), "red channel {}", texel[0]);
        assert_eq!(texel[1], 0);
        assert_eq!(texel[2], 0);
        assert_eq!(texel[3], 255);
    }
}

#[test]
fn test_empty_scene_copies_source() {
    let Some((device, queue)) = device() else {
        return;
    };
    let texture = frame_texture(&device, &queue, [40, 80, 120, 255]);
    let before = read_back(&device, &queue, &texture);
    let mut pass = SdfComputePass::new();
    pass.configure(Some(KernelSource::passthrough()), None);

    let outcome = pass
        .execute(
            &device,
            &queue,
            &FrameTarget::new(&texture),
            &SceneGraph::new(),
            &camera(),
            Some(&light()),
        )
        .expect("empty scene execute");
    assert!(matches!(outcome, FrameOutcome::Dispatched(r) if r.shape_count == 0));
    assert_eq!(read_back(&device, &queue, &texture), before);
}

#[test]
fn test_missing_light_releases_scratch() {
    let Some((device, queue)) = device() else {
        return;
    };
    let texture = frame_texture(&device, &queue, [0, 0, 0, 255]);
    let mut pass = SdfComputePass::new();
    pass.configure(Some(KernelSource::passthrough()), None);

    let result = pass.execute(
        &device,
        &queue,
        &FrameTarget::new(&texture),
        &red_sphere_scene(),
        &camera(),
        None,
    );
    assert!(matches!(result, Err(PassError::MissingLight)));
    assert_eq!(pass.live_scratch(), 0);
}

#[test]
fn test_missing_usage_rejected() {
    let Some((device, queue)) = device() else {
        return;
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("gpu-test-copy-only"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let mut pass = SdfComputePass::new();
    pass.configure(Some(KernelSource::passthrough()), None);

    let result = pass.execute(
        &device,
        &queue,
        &FrameTarget::new(&texture),
        &red_sphere_scene(),
        &camera(),
        Some(&light()),
    );
    match result {
        Err(PassError::MissingTextureUsage(missing)) => {
            assert_eq!(missing, wgpu::TextureUsages::RENDER_ATTACHMENT)
        }
        other => panic!("expected MissingTextureUsage, got {other:?}"),
    }
}

#[test]
fn test_accumulation_sums_frames() {
    let Some((device, queue)) = device() else {
        return;
    };
    let mut pass = SdfComputePass::new();
    pass.configure(Some(KernelSource::passthrough()), Some(BlendMaterial::additive()));
    let scene = SceneGraph::new();

    // Each frame re-reads the colour it wrote, so an empty scene doubles it.
    let texture = frame_texture(&device, &queue, [20, 0, 0, 0]);
    for _ in 0..2 {
        let outcome = pass
            .execute(
                &device,
                &queue,
                &FrameTarget::new(&texture),
                &scene,
                &camera(),
                Some(&light()),
            )
            .expect("accumulating execute");
        assert!(matches!(outcome, FrameOutcome::Dispatched(r) if r.accumulated));
    }

    // Frame 1: acc = 20. Frame 2: acc = 20 + 20.
    let pixels = read_back(&device, &queue, &texture);
    for texel in pixels.chunks_exact(4) {
        assert!((39..=41).contains(&texel[0]), "red channel {}", texel[0]);
    }
}

#[test]
fn test_target_size_follows_texture() {
    let Some((device, queue)) = device() else {
        return;
    };
    let texture = frame_texture(&device, &queue, [0, 0, 0, 255]);
    let target = FrameTarget::new(&texture);
    assert_eq!((target.width(), target.height()), (SIZE, SIZE));

    let mut pass = SdfComputePass::new();
    pass.configure(Some(KernelSource::passthrough()), None);
    let outcome = pass
        .execute(&device, &queue, &target, &red_sphere_scene(), &camera(), Some(&light()))
        .expect("active execute");
    assert!(matches!(outcome, FrameOutcome::Dispatched(r) if r.grid.to_array() == [8, 8, 1]));

    // The far corner is tinted too, not cleared by an undersized composite.
    let pixels = read_back(&device, &queue, &texture);
    let far = ((SIZE - 1) * SIZE + (SIZE - 1)) as usize * 4;
    assert!((126..=129).contains(&pixels[far]), "red channel {}", pixels[far]);
}

#[test]
fn test_reconfigure_discards_accumulation() {
    let Some((device, queue)) = device() else {
        return;
    };
    let mut pass = SdfComputePass::new();
    let scene = SceneGraph::new();

    for _ in 0..2 {
        // Same size both rounds, so only reconfiguring can reset the surface.
        pass.configure(Some(KernelSource::passthrough()), Some(BlendMaterial::additive()));
        let texture = frame_texture(&device, &queue, [20, 0, 0, 0]);
        pass.execute(
            &device,
            &queue,
            &FrameTarget::new(&texture),
            &scene,
            &camera(),
            Some(&light()),
        )
        .expect("accumulating execute");

        let pixels = read_back(&device, &queue, &texture);
        for texel in pixels.chunks_exact(4) {
            assert!((19..=21).contains(&texel[0]), "red channel {}", texel[0]);
        }
    }
}
