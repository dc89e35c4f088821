use std::sync::Arc;

use winit::window::Window;

use crate::error::InitError;
use crate::shader::{RecordedFrame, ShaderProgram};

use super::cube::{CubeMesh, CubeVertex};
use super::depth::DepthBuffer;
use super::pipeline::GpuProgram;

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    depth: DepthBuffer,
    clear_color: wgpu::Color,

    program: GpuProgram,
    cube: CubeMesh,
}

//
// ──────────────────────────────────────────────────────────────
//   Public API
// ──────────────────────────────────────────────────────────────
//

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        program: &ShaderProgram,
        clear_color: [f64; 4],
    ) -> Result<Self, InitError> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let adapter = request_adapter(&instance, &surface).await?;
        let info = adapter.get_info();
        log::info!("GPU ... OK [{} via {:?}]", info.name, info.backend);

        let (device, queue) = request_device(&adapter).await?;

        let config = configure_surface(&window, &surface, &adapter, &device)?;
        let depth = DepthBuffer::new(&device, &config);

        let program = GpuProgram::create(&device, program, config.format, CubeVertex::layout())?;
        let cube = CubeMesh::create(&device);
        log::debug!("cube mesh uploaded [{} vertices]", cube.vertex_count);

        let [r, g, b, a] = clear_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            clear_color: wgpu::Color { r, g, b, a },
            program,
            cube,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth.fit(&self.device, &self.config);
    }

    /// Upload the frame's uniforms, replay its draws and present.
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render(&mut self, frame: &RecordedFrame) -> Result<(), wgpu::SurfaceError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring a frame; skipping");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        self.program.upload(&self.device, &self.queue, frame);

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                });

        record_render_pass(
            &mut encoder,
            &view,
            &self.depth.view,
            self.clear_color,
            &self.program,
            &self.cube,
            frame,
        );

        self.queue.submit(Some(encoder.finish()));
        output.present();

        Ok(())
    }
}

//
// ──────────────────────────────────────────────────────────────
//   Initialization Helpers
// ──────────────────────────────────────────────────────────────
//

async fn request_adapter(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
) -> Result<wgpu::Adapter, InitError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await?;

    Ok(adapter)
}

async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue), InitError> {
    let pair = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Orbit Cubes Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        })
        .await?;

    Ok(pair)
}

fn configure_surface(
    window: &Window,
    surface: &wgpu::Surface<'_>,
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
) -> Result<wgpu::SurfaceConfiguration, InitError> {
    let size = window.inner_size();
    let caps = surface.get_capabilities(adapter);
    let format = pick_surface_format(&caps.formats).ok_or(InitError::UnsupportedSurface)?;

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    surface.configure(device, &config);
    Ok(config)
}

/// Colours are written as-is, like a plain GL framebuffer, so a linear
/// format is preferred over an sRGB one.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

//
// ──────────────────────────────────────────────────────────────
//   Render Pass
// ──────────────────────────────────────────────────────────────
//

fn record_render_pass(
    encoder: &mut wgpu::CommandEncoder,
    color_view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
    clear_color: wgpu::Color,
    program: &GpuProgram,
    cube: &CubeMesh,
    frame: &RecordedFrame,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Cube Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        ..Default::default()
    });

    pass.set_vertex_buffer(0, cube.vertex_buffer.slice(..));
    program.draw(&mut pass, frame);
}
