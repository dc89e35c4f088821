//! Per-frame transform pipeline: camera rig update from explicit input state,
//! then the grid draw pass through the active shader program.

mod grid;

pub use grid::Grid;

use glam::{Mat4, Vec2};

use crate::camera::{fixed_view, OrbitCamera, Projection};
use crate::config::{CameraMode, DemoConfig};
use crate::input::{update_drag, CursorCommand, DragState};
use crate::renderer::CUBE_VERTEX_COUNT;
use crate::shader::{ShaderError, ShaderProgram};

//
// ──────────────────────────────────────────────────────────────
//   Camera rig
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraRig
{
  Orbit
  {
    camera: OrbitCamera,
    drag: DragState,
  },
  Fixed
  {
    view: Mat4,
  },
}

impl CameraRig
{
  pub fn view(&self) -> Mat4
  {
    match self
    {
      CameraRig::Orbit { camera, .. } => camera.view_matrix(),
      CameraRig::Fixed { view } => *view,
    }
  }
}

/// What the window reported this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput
{
  pub drag_held: bool,
  pub cursor: Option<Vec2>,
  pub center: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate
{
  pub rig: CameraRig,
  /// New view matrix, only when the camera moved.
  pub view: Option<Mat4>,
  pub cursor: Vec<CursorCommand>,
}

/// Advance the camera rig by one frame of input.
pub fn step_camera(rig: CameraRig, input: &FrameInput) -> FrameUpdate
{
  match rig
  {
    CameraRig::Fixed { .. } => FrameUpdate { rig, view: None, cursor: Vec::new() },
    CameraRig::Orbit { camera, drag } =>
    {
      let update = update_drag(drag, input.drag_held, input.cursor, input.center);

      // Only re-upload the view while dragging, even with a zero delta
      let (camera, view) = match update.state
      {
        DragState::Dragging { .. } =>
        {
          let camera = camera.orbit(update.delta);
          (camera, Some(camera.view_matrix()))
        }
        DragState::Released => (camera, None),
      };

      FrameUpdate { rig: CameraRig::Orbit { camera, drag: update.state }, view, cursor: update.commands }
    }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   FrameRenderer
// ──────────────────────────────────────────────────────────────
//

/// Uniforms the frame loop writes every session.
const FRAME_UNIFORMS: [&str; 3] = ["projection", "view", "model"];

pub struct FrameRenderer
{
  rig: CameraRig,
  grid: Grid,
  projection: Mat4,
}

impl FrameRenderer
{
  pub fn new(config: &DemoConfig) -> Self
  {
    let rig = match config.camera.mode
    {
      CameraMode::Orbit =>
      {
        CameraRig::Orbit { camera: OrbitCamera::new(&config.camera), drag: DragState::Released }
      }
      CameraMode::Fixed => CameraRig::Fixed { view: fixed_view(config.camera.fixed_distance) },
    };

    let projection =
      Projection::new(&config.projection, config.window.width, config.window.height).matrix();

    Self { rig, grid: Grid::new(&config.grid), projection }
  }

  #[cfg(test)]
  pub fn rig(&self) -> CameraRig
  {
    self.rig
  }

  /// Upload the session-constant projection and the starting view.
  pub fn prime(&self, program: &mut ShaderProgram)
  {
    for name in FRAME_UNIFORMS
    {
      if !program.has_uniform(name)
      {
        log::warn!("shader program has no active `{name}` uniform; it will not be updated");
      }
    }

    program.set_uniform("projection", self.projection);
    program.set_uniform("view", self.rig.view());
  }

  /// Apply this frame's input; returns the cursor commands for the window.
  pub fn update(&mut self, input: &FrameInput, program: &mut ShaderProgram) -> Vec<CursorCommand>
  {
    let update = step_camera(self.rig, input);

    if let Some(view) = update.view
    {
      program.set_uniform("view", view);
    }

    self.rig = update.rig;
    update.cursor
  }

  /// Issue one draw per grid instance. Returns the number of draws.
  pub fn draw(&self, program: &mut ShaderProgram) -> Result<usize, ShaderError>
  {
    program.use_program()?;

    let mut count = 0;

    for offset in self.grid.offsets()
    {
      program.set_uniform("model", self.grid.model_matrix(offset));
      program.draw(0..CUBE_VERTEX_COUNT)?;
      count += 1;
    }

    Ok(count)
  }
}

#[cfg(test)]
mod tests
{
  use super::*;
  use crate::config::Variant;
  use crate::shader::{test_sources, ShaderStage};

  const CENTER: Vec2 = Vec2::new(320.0, 240.0);

  fn program() -> ShaderProgram
  {
    let mut program = ShaderProgram::new();
    program.compile_shader_source("vs", test_sources::VERTEX, ShaderStage::Vertex).unwrap();
    program.compile_shader_source("fs", test_sources::FRAGMENT, ShaderStage::Fragment).unwrap();
    program.link().unwrap();
    program
  }

  fn input(held: bool, cursor: Vec2) -> FrameInput
  {
    FrameInput { drag_held: held, cursor: Some(cursor), center: CENTER }
  }

  #[test]
  fn rubik_frame_draws_26_cubes()
  {
    let renderer = FrameRenderer::new(&DemoConfig::preset(Variant::Rubik));
    let mut program = program();
    renderer.prime(&mut program);

    assert_eq!(renderer.draw(&mut program).unwrap(), 26);

    let frame = program.finish_frame().unwrap();
    assert_eq!(frame.draws.len(), 26);
    assert!(frame.draws.iter().all(|d| d.vertices == (0..36)));
    // one camera snapshot, one model snapshot per cube
    assert_eq!(frame.arenas[0].len(), 256);
    assert_eq!(frame.arenas[1].len(), 26 * 256);
  }

  #[test]
  fn single_frame_draws_one_cube()
  {
    let renderer = FrameRenderer::new(&DemoConfig::preset(Variant::Single));
    let mut program = program();

    assert_eq!(renderer.draw(&mut program).unwrap(), 1);
  }

  #[test]
  fn draw_with_unlinked_program_fails()
  {
    let renderer = FrameRenderer::new(&DemoConfig::default());
    let mut program = ShaderProgram::new();

    assert!(matches!(renderer.draw(&mut program), Err(ShaderError::NotLinked)));
  }

  #[test]
  fn view_only_changes_while_dragging()
  {
    let rig = FrameRenderer::new(&DemoConfig::default()).rig();

    let idle = step_camera(rig, &input(false, Vec2::new(5.0, 5.0)));
    assert_eq!(idle.view, None);
    assert_eq!(idle.rig, rig);

    let pressed = step_camera(rig, &input(true, Vec2::new(5.0, 5.0)));
    assert!(pressed.view.is_some());

    let dragged = step_camera(pressed.rig, &input(true, CENTER + Vec2::new(40.0, 0.0)));
    let CameraRig::Orbit { camera, .. } = dragged.rig
    else
    {
      panic!("expected orbit rig");
    };
    assert!((camera.yaw - (std::f32::consts::FRAC_PI_2 + 0.2)).abs() < 1e-6);
    assert_eq!(dragged.view, Some(camera.view_matrix()));
  }

  #[test]
  fn fixed_rig_ignores_input()
  {
    let rig = FrameRenderer::new(&DemoConfig::preset(Variant::Static)).rig();
    let update = step_camera(rig, &input(true, Vec2::new(600.0, 10.0)));

    assert_eq!(update.rig, rig);
    assert_eq!(update.view, None);
    assert!(update.cursor.is_empty());
    assert!(rig.view().abs_diff_eq(Mat4::from_translation(glam::Vec3::new(0.0, 0.0, -8.0)), 1e-6));
  }

  #[test]
  fn update_uploads_view_while_dragging()
  {
    let mut renderer = FrameRenderer::new(&DemoConfig::default());
    let mut program = program();
    renderer.prime(&mut program);

    renderer.update(&input(true, Vec2::ZERO), &mut program);
    let commands = renderer.update(&input(true, CENTER + Vec2::new(0.0, 100.0)), &mut program);

    assert_eq!(commands, vec![CursorCommand::MoveTo(CENTER)]);
    let CameraRig::Orbit { camera, .. } = renderer.rig()
    else
    {
      panic!("expected orbit rig");
    };
    assert!((camera.pitch - 0.5).abs() < 1e-6);

    renderer.draw(&mut program).unwrap();
    let frame = program.finish_frame().unwrap();

    // camera block: projection at 0, view at 64
    assert_eq!(&frame.arenas[0][64..128], bytemuck::bytes_of(&camera.view_matrix()));
  }

  #[test]
  fn released_frames_keep_the_last_uploaded_view()
  {
    let mut renderer = FrameRenderer::new(&DemoConfig::default());
    let mut program = program();
    renderer.prime(&mut program);
    let initial = renderer.rig().view();

    renderer.update(&input(false, Vec2::new(50.0, 60.0)), &mut program);
    renderer.draw(&mut program).unwrap();
    let idle = program.finish_frame().unwrap();
    assert_eq!(&idle.arenas[0][64..128], bytemuck::bytes_of(&initial));

    renderer.update(&input(true, CENTER), &mut program);
    renderer.update(&input(true, CENTER + Vec2::new(40.0, 0.0)), &mut program);
    let dragged = renderer.rig().view();
    renderer.update(&input(false, CENTER), &mut program);

    renderer.draw(&mut program).unwrap();
    let released = program.finish_frame().unwrap();
    assert_ne!(dragged, initial);
    assert_eq!(&released.arenas[0][64..128], bytemuck::bytes_of(&dragged));
  }
}
