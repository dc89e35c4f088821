mod drag;

pub use drag::{update_drag, CursorCommand, DragState};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use winit::event::{ElementState, MouseButton, WindowEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragButton
{
  Left,
  Middle,
  Right,
}

pub struct InputState
{
  /// Last position the window reported; None before the first move and
  /// after the cursor leaves the window.
  pub cursor: Option<Vec2>,

  pub left_held: bool,
  pub middle_held: bool,
  pub right_held: bool,
}

impl InputState
{
  pub fn new() -> Self
  {
    Self { cursor: None, left_held: false, middle_held: false, right_held: false }
  }

  pub fn handle_event(&mut self, event: &WindowEvent)
  {
    match event
    {
      WindowEvent::CursorMoved { position, .. } =>
      {
        self.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
      }

      WindowEvent::CursorLeft { .. } =>
      {
        self.cursor = None;
      }

      WindowEvent::MouseInput { state, button, .. } =>
      {
        let pressed = *state == ElementState::Pressed;

        match button
        {
          MouseButton::Left => self.left_held = pressed,
          MouseButton::Middle => self.middle_held = pressed,
          MouseButton::Right => self.right_held = pressed,
          _ =>
          {}
        }
      }

      // Focus loss swallows the release event
      WindowEvent::Focused(false) =>
      {
        self.left_held = false;
        self.middle_held = false;
        self.right_held = false;
      }

      _ =>
      {}
    }
  }

  pub fn is_held(&self, button: DragButton) -> bool
  {
    match button
    {
      DragButton::Left => self.left_held,
      DragButton::Middle => self.middle_held,
      DragButton::Right => self.right_held,
    }
  }

  /// Record a cursor move we caused ourselves. Not every platform reports
  /// programmatic moves back as `CursorMoved`.
  pub fn warp_cursor(&mut self, position: Vec2)
  {
    self.cursor = Some(position);
  }
}
