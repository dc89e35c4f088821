use glam::Vec2;

//
// ──────────────────────────────────────────────────────────────
//   Drag state machine
//
//   Released ──(button held)──▶ Dragging ──(button up)──▶ Released
//
//   While dragging, the cursor is hidden and pinned to the window
//   centre; every frame reports how far it moved from the centre
//   and re-centres it, so rotation is unbounded. Releasing puts
//   the cursor back where the drag started, if that position was
//   ever known.
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState
{
  #[default]
  Released,
  Dragging
  {
    restore_to: Option<Vec2>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorCommand
{
  Hide,
  Show,
  MoveTo(Vec2),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragUpdate
{
  pub state: DragState,
  /// Cursor offset from the centre this frame; zero unless dragging.
  pub delta: Vec2,
  pub commands: Vec<CursorCommand>,
}

//
// ──────────────────────────────────────────────────────────────
//   Public API
// ──────────────────────────────────────────────────────────────
//

/// `cursor` is None until the window has reported a position.
pub fn update_drag(state: DragState, held: bool, cursor: Option<Vec2>, center: Vec2) -> DragUpdate
{
  match (state, held)
  {
    (DragState::Released, false) => idle(state),
    (DragState::Released, true) => begin_drag(cursor, center),
    (DragState::Dragging { restore_to }, true) => continue_drag(restore_to, cursor, center),
    (DragState::Dragging { restore_to }, false) => end_drag(restore_to),
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Transitions
// ──────────────────────────────────────────────────────────────
//

fn idle(state: DragState) -> DragUpdate
{
  DragUpdate { state, delta: Vec2::ZERO, commands: Vec::new() }
}

fn begin_drag(cursor: Option<Vec2>, center: Vec2) -> DragUpdate
{
  DragUpdate {
    state: DragState::Dragging { restore_to: cursor },
    delta: Vec2::ZERO,
    commands: vec![CursorCommand::Hide, CursorCommand::MoveTo(center)],
  }
}

fn continue_drag(restore_to: Option<Vec2>, cursor: Option<Vec2>, center: Vec2) -> DragUpdate
{
  DragUpdate {
    state: DragState::Dragging { restore_to },
    delta: cursor.map_or(Vec2::ZERO, |cursor| cursor - center),
    commands: vec![CursorCommand::MoveTo(center)],
  }
}

fn end_drag(restore_to: Option<Vec2>) -> DragUpdate
{
  let mut commands = vec![CursorCommand::Show];
  commands.extend(restore_to.map(CursorCommand::MoveTo));

  DragUpdate { state: DragState::Released, delta: Vec2::ZERO, commands }
}

#[cfg(test)]
mod tests
{
  use super::*;

  const CENTER: Vec2 = Vec2::new(320.0, 240.0);

  #[test]
  fn released_without_button_does_nothing()
  {
    let update = update_drag(DragState::Released, false, Some(Vec2::new(10.0, 20.0)), CENTER);

    assert_eq!(update.state, DragState::Released);
    assert_eq!(update.delta, Vec2::ZERO);
    assert!(update.commands.is_empty());
  }

  #[test]
  fn press_hides_and_centres_cursor()
  {
    let update = update_drag(DragState::Released, true, Some(Vec2::new(10.0, 20.0)), CENTER);

    assert_eq!(update.state, DragState::Dragging { restore_to: Some(Vec2::new(10.0, 20.0)) });
    assert_eq!(update.delta, Vec2::ZERO);
    assert_eq!(update.commands, vec![CursorCommand::Hide, CursorCommand::MoveTo(CENTER)]);
  }

  #[test]
  fn dragging_reports_offset_from_centre()
  {
    let state = DragState::Dragging { restore_to: Some(Vec2::new(10.0, 20.0)) };
    let update = update_drag(state, true, Some(Vec2::new(330.0, 235.0)), CENTER);

    assert_eq!(update.delta, Vec2::new(10.0, -5.0));
    assert_eq!(update.commands, vec![CursorCommand::MoveTo(CENTER)]);
  }

  #[test]
  fn release_restores_pre_drag_position_exactly()
  {
    let start = Vec2::new(123.25, 87.5);
    let mut cursor = start;
    let mut state = DragState::Released;

    let frames = [
      (true, Vec2::ZERO),
      (true, Vec2::new(15.0, -3.0)),
      (true, Vec2::new(-40.0, 22.0)),
      (false, Vec2::ZERO),
    ];
    let mut last = None;

    for (held, motion) in frames
    {
      let update = update_drag(state, held, Some(cursor + motion), CENTER);

      for command in &update.commands
      {
        if let CursorCommand::MoveTo(to) = command
        {
          cursor = *to;
        }
      }

      state = update.state;
      last = Some(update);
    }

    let last = last.unwrap();
    assert_eq!(state, DragState::Released);
    assert_eq!(cursor, start);
    assert!(last.commands.contains(&CursorCommand::Show));
  }

  #[test]
  fn unknown_start_position_is_not_restored()
  {
    let pressed = update_drag(DragState::Released, true, None, CENTER);
    assert_eq!(pressed.state, DragState::Dragging { restore_to: None });
    assert_eq!(pressed.commands, vec![CursorCommand::Hide, CursorCommand::MoveTo(CENTER)]);

    let released = update_drag(pressed.state, false, Some(CENTER), CENTER);
    assert_eq!(released.state, DragState::Released);
    assert_eq!(released.commands, vec![CursorCommand::Show]);
  }

  #[test]
  fn missing_cursor_while_dragging_gives_zero_delta()
  {
    let state = DragState::Dragging { restore_to: Some(Vec2::ONE) };
    let update = update_drag(state, true, None, CENTER);

    assert_eq!(update.delta, Vec2::ZERO);
    assert_eq!(update.commands, vec![CursorCommand::MoveTo(CENTER)]);
  }
}
