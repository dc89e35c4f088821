use glam::{IVec3, Mat4, Vec3};

use crate::config::GridConfig;

//
// ──────────────────────────────────────────────────────────────
//   Instance grid
//
//   Integer offsets in [-extent, extent]³, visited x, then y,
//   then z. Instances are independent of each other.
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid
{
  pub extent: i32,
  pub scale: f32,
  pub spacing: f32,
  pub skip_origin: bool,
}

impl Grid
{
  pub fn new(config: &GridConfig) -> Self
  {
    Self {
      extent: config.extent.max(0),
      scale: config.scale,
      spacing: config.spacing,
      skip_origin: config.skip_origin,
    }
  }

  pub fn offsets(&self) -> impl Iterator<Item = IVec3>
  {
    let extent = self.extent;
    let skip_origin = self.skip_origin;

    (-extent..=extent)
      .flat_map(move |x| (-extent..=extent).map(move |y| (x, y)))
      .flat_map(move |(x, y)| (-extent..=extent).map(move |z| IVec3::new(x, y, z)))
      .filter(move |offset| !(skip_origin && *offset == IVec3::ZERO))
  }

  /// translate(offset · (scale + spacing)) · scale(scale)
  pub fn model_matrix(&self, offset: IVec3) -> Mat4
  {
    let step = self.scale + self.spacing;

    Mat4::from_translation(offset.as_vec3() * step) * Mat4::from_scale(Vec3::splat(self.scale))
  }
}
