use wgpu::*;

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Depth attachment matching the surface size.
pub struct DepthBuffer
{
  pub view: TextureView,
  width: u32,
  height: u32,
}

impl DepthBuffer
{
  pub fn new(device: &Device, config: &SurfaceConfiguration) -> Self
  {
    let texture = device.create_texture(&TextureDescriptor {
      label: Some("Depth Buffer"),
      size: Extent3d { width: config.width, height: config.height, depth_or_array_layers: 1 },
      mip_level_count: 1,
      sample_count: 1,
      dimension: TextureDimension::D2,
      format: DEPTH_FORMAT,
      usage: TextureUsages::RENDER_ATTACHMENT,
      view_formats: &[],
    });

    Self {
      view: texture.create_view(&TextureViewDescriptor::default()),
      width: config.width,
      height: config.height,
    }
  }

  /// Recreate after the surface changed size; no-op otherwise.
  pub fn fit(&mut self, device: &Device, config: &SurfaceConfiguration)
  {
    if self.width != config.width || self.height != config.height
    {
      *self = Self::new(device, config);
    }
  }
}
