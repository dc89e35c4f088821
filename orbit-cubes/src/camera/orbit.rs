use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;

//
// ──────────────────────────────────────────────────────────────
//   Orbit camera (Y-up, right-handed)
//
//   The eye sits on a sphere of fixed radius around the origin:
//     yaw   = angle around +Y, measured from +X towards +Z
//     pitch = angle above the XZ plane, clamped to ±pitch_limit
//
//   The camera is a plain value: `orbit` returns the updated
//   state instead of mutating shared state.
// ──────────────────────────────────────────────────────────────
//

// just below the pole, where the Y up vector would degenerate
const PITCH_LIMIT_MAX: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera
{
  pub yaw: f32,
  pub pitch: f32,
  pub radius: f32,
  pub sensitivity: f32,
  pub pitch_limit: f32,
}

impl OrbitCamera
{
  pub fn new(config: &CameraConfig) -> Self
  {
    let pitch_limit = config.pitch_limit.clamp(0.0, PITCH_LIMIT_MAX);

    Self {
      yaw: config.initial_yaw,
      pitch: config.initial_pitch.clamp(-pitch_limit, pitch_limit),
      radius: config.radius,
      sensitivity: config.sensitivity,
      pitch_limit,
    }
  }

  /// Rotate by a cursor delta in pixels.
  pub fn orbit(self, delta: Vec2) -> Self
  {
    let yaw = self.yaw + delta.x * self.sensitivity;
    let pitch = (self.pitch + delta.y * self.sensitivity).clamp(-self.pitch_limit, self.pitch_limit);

    Self { yaw, pitch, ..self }
  }

  pub fn eye_position(&self) -> Vec3
  {
    let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
    let (sin_pitch, cos_pitch) = self.pitch.sin_cos();

    self.radius * Vec3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw)
  }

  pub fn view_matrix(&self) -> Mat4
  {
    Mat4::look_at_rh(self.eye_position(), Vec3::ZERO, Vec3::Y)
  }
}

#[cfg(test)]
mod tests
{
  use super::*;

  fn camera() -> OrbitCamera
  {
    OrbitCamera::new(&CameraConfig::default())
  }

  #[test]
  fn pitch_is_clamped_for_any_delta()
  {
    let start = camera();

    for dy in [-1.0e6, -2000.0, -201.0, -1.0, 0.0, 1.0, 199.0, 201.0, 5000.0, 1.0e9]
    {
      let cam = start.orbit(Vec2::new(0.0, dy));
      assert!(cam.pitch >= -1.0 && cam.pitch <= 1.0, "pitch {} for dy {dy}", cam.pitch);
    }

    // accumulated drags stay clamped too
    let mut cam = start;
    for _ in 0..100
    {
      cam = cam.orbit(Vec2::new(3.0, 50.0));
    }
    assert_eq!(cam.pitch, 1.0);
  }

  #[test]
  fn eye_stays_on_the_orbit_sphere()
  {
    let start = camera();

    for i in -20..=20
    {
      for j in -20..=20
      {
        let cam = start.orbit(Vec2::new(i as f32 * 97.0, j as f32 * 13.0));
        let distance = cam.eye_position().length();
        assert!((distance - cam.radius).abs() < 1e-4, "distance {distance}");
      }
    }
  }

  #[test]
  fn yaw_follows_horizontal_delta()
  {
    let cam = camera().orbit(Vec2::new(100.0, 0.0));

    assert!((cam.yaw - (std::f32::consts::FRAC_PI_2 + 0.5)).abs() < 1e-6);
    assert_eq!(cam.pitch, 0.0);
  }

  #[test]
  fn initial_view_looks_down_negative_z()
  {
    let view = camera().view_matrix();
    let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, -8.0));

    assert!(view.abs_diff_eq(expected, 1e-5));
  }

  #[test]
  fn pitch_limit_is_kept_below_the_pole()
  {
    let config = CameraConfig { pitch_limit: 3.0, ..CameraConfig::default() };
    let cam = OrbitCamera::new(&config).orbit(Vec2::new(0.0, 1.0e6));

    assert!(cam.pitch < std::f32::consts::FRAC_PI_2);
    assert!(!cam.view_matrix().is_nan());
  }
}
