use glam::{Mat4, Vec3};

use crate::config::ProjectionConfig;

//
// ──────────────────────────────────────────────────────────────
//   Projection (fixed for the session)
// ──────────────────────────────────────────────────────────────
//

pub struct Projection
{
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Projection
{
  pub fn new(config: &ProjectionConfig, width: u32, height: u32) -> Self
  {
    Self {
      aspect: width.max(1) as f32 / height.max(1) as f32,
      fovy: config.fov_y_degrees.to_radians(),
      znear: config.near,
      zfar: config.far,
    }
  }

  pub fn matrix(&self) -> Mat4
  {
    Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar)
  }
}

/// View for the fixed-camera variant: the scene pushed `distance` units
/// down -Z.
pub fn fixed_view(distance: f32) -> Mat4
{
  Mat4::from_translation(Vec3::new(0.0, 0.0, -distance))
}
