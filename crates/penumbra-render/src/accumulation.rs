//! Optional blended composite of kernel output over previous frames.
//!
//! Without a material the kernel output replaces the frame colour. With one,
//! the output is drawn through the material into a persistent accumulation
//! surface, and that surface is what lands in the frame colour.

use std::borrow::Cow;

use crate::blit;

/// Format of the persistent accumulation surface.
pub const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// A full-screen shader plus blend state. The module must export `vs_main`
/// and `fs_main` and read the kernel output from
/// `@group(0) @binding(0) texture_2d<f32>`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendMaterial {
    label: String,
    wgsl: Cow<'static, str>,
    blend: wgpu::BlendState,
}

impl BlendMaterial {
    pub fn new(label: impl Into<String>, wgsl: impl Into<Cow<'static, str>>, blend: wgpu::BlendState) -> Self {
        Self {
            label: label.into(),
            wgsl: wgsl.into(),
            blend,
        }
    }

    /// Sum every frame's output onto the surface.
    pub fn additive() -> Self {
        let add = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };
        Self::new(
            "additive-material",
            blit::blit_source(),
            wgpu::BlendState {
                color: add,
                alpha: add,
            },
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn blend(&self) -> wgpu::BlendState {
        self.blend
    }
}

/// Material pipeline plus the surface it accumulates into. The surface is
/// recreated (and so cleared) whenever the frame size changes.
pub(crate) struct Accumulator {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    surface: Option<AccumulationSurface>,
}

struct AccumulationSurface {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Accumulator {
    pub(crate) fn new(device: &wgpu::Device, material: &BlendMaterial) -> Self {
        log::info!("Compiling blend material '{}'", material.label);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(material.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(material.wgsl.clone()),
        });
        let layout = blit::texture_bind_group_layout(device, "material-bgl");
        let pipeline = blit::fullscreen_pipeline(
            device,
            "material-pipeline",
            &module,
            &layout,
            ACCUMULATION_FORMAT,
            Some(material.blend),
        );
        Self {
            pipeline,
            layout,
            surface: None,
        }
    }

    /// Blend `source` onto the accumulation surface and return its view.
    pub(crate) fn accumulate(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> &wgpu::TextureView {
        let stale = self
            .surface
            .as_ref()
            .map_or(true, |s| s.width != width || s.height != height);
        if stale {
            if let Some(old) = self.surface.take() {
                old.texture.destroy();
            }
        }

        let bind_group = blit::texture_bind_group(device, &self.layout, source);
        let surface = self.surface.get_or_insert_with(|| {
            log::debug!("Accumulation surface created at {width}x{height}");
            AccumulationSurface::new(device, width, height)
        });
        let load = if stale {
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
        } else {
            wgpu::LoadOp::Load
        };
        blit::draw_fullscreen(encoder, "material-pass", &self.pipeline, &bind_group, &surface.view, load);
        &surface.view
    }
}

impl Drop for Accumulator {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.take() {
            surface.texture.destroy();
        }
    }
}

impl AccumulationSurface {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sdf-accumulation"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ACCUMULATION_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }
}
