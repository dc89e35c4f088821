use std::sync::Arc;

use glam::Vec2;
use winit::{
  application::ApplicationHandler,
  dpi::{PhysicalPosition, PhysicalSize},
  event::WindowEvent,
  event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
  window::{Window, WindowId},
};

use crate::config::{DemoConfig, ShaderPaths};
use crate::error::InitError;
use crate::frame::{FrameInput, FrameRenderer};
use crate::input::{CursorCommand, InputState};
use crate::renderer::Renderer;
use crate::shader::{ShaderError, ShaderProgram, ShaderStage};

pub fn run(config: DemoConfig) -> anyhow::Result<()>
{
  let event_loop = EventLoop::new().map_err(InitError::from)?;
  let mut app = OrbitApp::new(config);

  event_loop.run_app(&mut app).map_err(InitError::from)?;

  match app.fatal.take()
  {
    Some(err) => Err(err),
    None => Ok(()),
  }
}

struct OrbitApp
{
  config: DemoConfig,
  window: Option<Arc<Window>>,
  renderer: Option<Renderer>,
  program: ShaderProgram,
  frame: FrameRenderer,
  input: InputState,
  fatal: Option<anyhow::Error>,
}

impl OrbitApp
{
  fn new(config: DemoConfig) -> Self
  {
    let frame = FrameRenderer::new(&config);

    Self {
      config,
      window: None,
      renderer: None,
      program: ShaderProgram::new(),
      frame,
      input: InputState::new(),
      fatal: None,
    }
  }

  fn init_window_and_renderer(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()>
  {
    if self.window.is_some()
    {
      return Ok(());
    }

    log::info!("INITIALIZING SYSTEMS");

    let settings = &self.config.window;
    let attrs = Window::default_attributes()
      .with_title(settings.title.clone())
      .with_inner_size(PhysicalSize::new(settings.width, settings.height))
      .with_resizable(false);

    let window = Arc::new(event_loop.create_window(attrs).map_err(InitError::from)?);
    self.window = Some(window.clone());
    log::info!("window ... OK [{}x{}]", settings.width, settings.height);

    self.program = build_program(&self.config.shaders)?;
    log::info!("shader program ... OK");

    let renderer = pollster::block_on(Renderer::new(window, &self.program, self.config.clear_color))?;
    self.renderer = Some(renderer);

    self.frame.prime(&mut self.program);

    log::info!("RUNNING");
    Ok(())
  }

  fn handle_window_event(&mut self, elwt: &ActiveEventLoop, window_id: WindowId, event: WindowEvent)
  {
    match &self.window
    {
      Some(w) if w.id() == window_id =>
      {}
      _ => return,
    }

    self.input.handle_event(&event);

    match event
    {
      WindowEvent::CloseRequested =>
      {
        elwt.exit();
      }

      WindowEvent::Resized(size) =>
      {
        if let Some(renderer) = &mut self.renderer
        {
          renderer.resize(size.width, size.height);
        }
      }

      _ =>
      {}
    }
  }

  /// input → camera → uniforms + draws → submit/present
  fn frame(&mut self) -> anyhow::Result<()>
  {
    let (Some(window), Some(renderer)) = (&self.window, &mut self.renderer)
    else
    {
      return Ok(());
    };

    let size = window.inner_size();
    let input = FrameInput {
      drag_held: self.input.is_held(self.config.camera.drag_button),
      cursor: self.input.cursor,
      center: Vec2::new(size.width as f32 / 2.0, size.height as f32 / 2.0),
    };

    let commands = self.frame.update(&input, &mut self.program);
    apply_cursor_commands(window, &mut self.input, &commands);

    self.frame.draw(&mut self.program)?;

    if let Some(recorded) = self.program.finish_frame()
    {
      renderer.render(&recorded)?;
    }

    window.request_redraw();
    Ok(())
  }

  /// Log, release the window and GPU, and stop the loop. `run` returns the
  /// error so the process exits non-zero.
  fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error)
  {
    log::error!("{err:#}");

    self.renderer = None;
    self.window = None;

    if self.fatal.is_none()
    {
      self.fatal = Some(err);
    }

    event_loop.exit();
  }
}

fn build_program(paths: &ShaderPaths) -> Result<ShaderProgram, ShaderError>
{
  let mut program = ShaderProgram::new();

  program.compile_shader(&paths.vertex, ShaderStage::Vertex)?;
  program.compile_shader(&paths.fragment, ShaderStage::Fragment)?;
  program.link()?;

  Ok(program)
}

fn apply_cursor_commands(window: &Window, input: &mut InputState, commands: &[CursorCommand])
{
  for command in commands
  {
    match *command
    {
      CursorCommand::Hide => window.set_cursor_visible(false),
      CursorCommand::Show => window.set_cursor_visible(true),
      CursorCommand::MoveTo(pos) =>
      {
        let target = PhysicalPosition::new(pos.x as f64, pos.y as f64);

        if let Err(err) = window.set_cursor_position(target)
        {
          log::debug!("could not move the cursor: {err}");
        }

        input.warp_cursor(pos);
      }
    }
  }
}

impl ApplicationHandler for OrbitApp
{
  fn resumed(&mut self, event_loop: &ActiveEventLoop)
  {
    event_loop.set_control_flow(ControlFlow::Wait);

    if let Err(err) = self.init_window_and_renderer(event_loop)
    {
      self.fail(event_loop, err);
    }
  }

  fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent)
  {
    self.handle_window_event(event_loop, window_id, event);
  }

  fn about_to_wait(&mut self, event_loop: &ActiveEventLoop)
  {
    if let Err(err) = self.frame()
    {
      self.fail(event_loop, err);
    }
  }
}
