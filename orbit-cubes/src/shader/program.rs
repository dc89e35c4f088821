use std::ops::Range;
use std::path::Path;

use super::reflect::{link_stages, LinkedLayout, UniformValue};
use super::stage::{CompiledStage, ShaderStage};
use super::uniforms::{RecordedFrame, Recording, UniformStore};
use super::ShaderError;

//
// ──────────────────────────────────────────────────────────────
//   ShaderProgram
//
//   created empty → compile_shader (per stage) → link → use_program
//   → set_uniform / draw → finish_frame
//
//   `linked` is only Some after a successful link; any compile or
//   failed link clears it.
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Default)]
pub struct ShaderProgram
{
  vertex: Option<CompiledStage>,
  fragment: Option<CompiledStage>,
  linked: Option<LinkedLayout>,
  uniforms: UniformStore,
  recording: Option<Recording>,
}

impl ShaderProgram
{
  pub fn new() -> Self
  {
    Self::default()
  }

  pub fn compile_shader(&mut self, path: impl AsRef<Path>, stage: ShaderStage) -> Result<(), ShaderError>
  {
    let path = path.as_ref();

    if let Some(named) = ShaderStage::from_path(path)
    {
      if named != stage
      {
        log::warn!("{} is named like a {named} shader but compiled as {stage}", path.display());
      }
    }

    match std::fs::read_to_string(path)
    {
      Ok(source) => self.compile_shader_source(&path.display().to_string(), &source, stage),
      Err(source) => self.attach(Err(ShaderError::Io { path: path.to_path_buf(), source })),
    }
  }

  pub fn compile_shader_source(
    &mut self,
    label: &str,
    source: &str,
    stage: ShaderStage,
  ) -> Result<(), ShaderError>
  {
    let compiled = CompiledStage::from_source(label, source, stage);
    self.attach(compiled)
  }

  fn attach(&mut self, compiled: Result<CompiledStage, ShaderError>) -> Result<(), ShaderError>
  {
    self.unlink();

    let compiled = compiled.inspect_err(|err| log::error!("{err}"))?;
    log::debug!("compiled {} shader `{}` ({})", compiled.stage, compiled.label, compiled.entry_point);

    match compiled.stage
    {
      ShaderStage::Vertex => self.vertex = Some(compiled),
      ShaderStage::Fragment => self.fragment = Some(compiled),
    }

    Ok(())
  }

  pub fn link(&mut self) -> Result<(), ShaderError>
  {
    self.unlink();

    let result = match (&self.vertex, &self.fragment)
    {
      (Some(vertex), Some(fragment)) => link_stages(vertex, fragment),
      (None, _) => Err(ShaderError::Link("no vertex stage attached".into())),
      (_, None) => Err(ShaderError::Link("no fragment stage attached".into())),
    };

    let layout = result.inspect_err(|err| log::error!("{err}"))?;

    log::debug!(
      "linked shader program: {} uniform block(s), {} vertex input(s)",
      layout.blocks.len(),
      layout.vertex_inputs.len()
    );

    self.uniforms = UniformStore::new(&layout.blocks);
    self.linked = Some(layout);

    Ok(())
  }

  fn unlink(&mut self)
  {
    self.linked = None;
    self.recording = None;
    self.uniforms = UniformStore::default();
  }

  pub fn is_linked(&self) -> bool
  {
    self.linked.is_some()
  }

  /// Make this the program the next draws go through. Calling it again in
  /// the same frame keeps the current recording.
  pub fn use_program(&mut self) -> Result<(), ShaderError>
  {
    if !self.is_linked()
    {
      return Err(ShaderError::NotLinked);
    }

    if self.recording.is_none()
    {
      self.recording = Some(Recording::new(self.uniforms.block_count()));
    }

    Ok(())
  }

  /// Upload a named uniform. Names that don't resolve to an active uniform
  /// and values of the wrong type are ignored.
  pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>)
  {
    let value = value.into();

    let Some(layout) = &self.linked
    else
    {
      log::warn!("set_uniform(`{name}`) before the program was linked; ignoring");
      return;
    };

    let Some(location) = layout.uniform(name)
    else
    {
      log::debug!("uniform `{name}` is not active in this program; ignoring");
      return;
    };

    if location.kind != value.kind()
    {
      log::warn!("uniform `{name}` is {:?} but got {:?}; ignoring", location.kind, value.kind());
      return;
    }

    self.uniforms.write(location.block, location.offset, value.as_bytes());
  }

  pub fn has_uniform(&self, name: &str) -> bool
  {
    self.linked.as_ref().is_some_and(|layout| layout.uniform(name).is_some())
  }

  /// Record a triangle-list draw with the uniform values as they are now.
  pub fn draw(&mut self, vertices: Range<u32>) -> Result<(), ShaderError>
  {
    let recording = self.recording.as_mut().ok_or(ShaderError::NotInUse)?;
    recording.record(&mut self.uniforms, vertices);
    Ok(())
  }

  /// End the current recording. None if the program was not used.
  pub fn finish_frame(&mut self) -> Option<RecordedFrame>
  {
    self.recording.take().map(Recording::finish)
  }

  pub fn layout(&self) -> Option<&LinkedLayout>
  {
    self.linked.as_ref()
  }

  pub fn stage(&self, stage: ShaderStage) -> Option<&CompiledStage>
  {
    match stage
    {
      ShaderStage::Vertex => self.vertex.as_ref(),
      ShaderStage::Fragment => self.fragment.as_ref(),
    }
  }

  #[cfg(test)]
  fn uniform_bytes(&self, name: &str) -> Option<&[u8]>
  {
    let location = self.linked.as_ref()?.uniform(name)?;
    let start = location.offset as usize;
    Some(&self.uniforms.bytes(location.block)[start..start + location.kind.size()])
  }
}

#[cfg(test)]
mod tests
{
  use glam::{Mat4, Vec3};

  use super::*;
  use crate::config::{DemoConfig, Variant};
  use crate::shader::test_sources;

  fn linked_program() -> ShaderProgram
  {
    let mut program = ShaderProgram::new();
    program.compile_shader_source("vs", test_sources::VERTEX, ShaderStage::Vertex).unwrap();
    program.compile_shader_source("fs", test_sources::FRAGMENT, ShaderStage::Fragment).unwrap();
    program.link().unwrap();
    program
  }

  #[test]
  fn new_program_is_not_linked()
  {
    let mut program = ShaderProgram::new();

    assert!(!program.is_linked());
    assert!(matches!(program.use_program(), Err(ShaderError::NotLinked)));
  }

  #[test]
  fn links_and_uses()
  {
    let mut program = linked_program();

    assert!(program.is_linked());
    assert!(program.use_program().is_ok());
    assert!(program.has_uniform("projection"));
    assert!(program.has_uniform("model"));
  }

  #[test]
  fn missing_stage_fails_to_link()
  {
    let mut program = ShaderProgram::new();
    program.compile_shader_source("vs", test_sources::VERTEX, ShaderStage::Vertex).unwrap();

    assert!(matches!(program.link(), Err(ShaderError::Link(_))));
    assert!(!program.is_linked());
  }

  #[test]
  fn failed_relink_clears_link_status()
  {
    let mut program = linked_program();
    program
      .compile_shader_source("fs", test_sources::FRAGMENT_BAD_INPUT, ShaderStage::Fragment)
      .unwrap();

    assert!(!program.is_linked());
    assert!(program.link().is_err());
    assert!(!program.is_linked());
  }

  #[test]
  fn compile_error_leaves_program_unlinked()
  {
    let mut program = linked_program();
    let err = program.compile_shader_source("fs", "not wgsl", ShaderStage::Fragment);

    assert!(matches!(err, Err(ShaderError::Compile { .. })));
    assert!(!program.is_linked());
  }

  #[test]
  fn missing_file_is_an_io_error_and_unlinks()
  {
    let mut program = linked_program();
    let err = program.compile_shader("does/not/exist.frag.wgsl", ShaderStage::Fragment);

    assert!(matches!(err, Err(ShaderError::Io { .. })));
    assert!(!program.is_linked());
  }

  #[test]
  fn shipped_shaders_compile_and_link_for_every_variant()
  {
    for variant in [Variant::Rubik, Variant::Single, Variant::Static]
    {
      let shaders = DemoConfig::preset(variant).shaders;
      let mut program = ShaderProgram::new();

      program.compile_shader(&shaders.vertex, ShaderStage::Vertex).unwrap();
      program.compile_shader(&shaders.fragment, ShaderStage::Fragment).unwrap();
      program.link().unwrap();

      assert_eq!(program.stage(ShaderStage::Vertex).unwrap().label, shaders.vertex.display().to_string());
      for name in ["projection", "view", "model"]
      {
        assert!(program.has_uniform(name), "{variant:?}: `{name}` is not active");
      }
    }
  }

  #[test]
  fn nonexistent_uniform_is_a_no_op()
  {
    let mut program = linked_program();
    program.set_uniform("model", Mat4::IDENTITY);

    program.set_uniform("nonexistent_uniform", Mat4::from_scale(Vec3::splat(2.0)));

    assert!(!program.has_uniform("nonexistent_uniform"));
    assert_eq!(program.uniform_bytes("model"), Some(bytemuck::bytes_of(&Mat4::IDENTITY)));
  }

  #[test]
  fn eliminated_uniform_is_a_no_op()
  {
    let mut program = linked_program();
    program.set_uniform("unused_tint", glam::Vec4::ONE);

    assert!(!program.has_uniform("unused_tint"));
  }

  #[test]
  fn wrong_type_is_ignored()
  {
    let mut program = linked_program();
    program.set_uniform("view", 1.0_f32);

    assert_eq!(program.uniform_bytes("view"), Some(&[0u8; 64][..]));
  }

  #[test]
  fn set_uniform_before_link_is_ignored()
  {
    let mut program = ShaderProgram::new();
    program.set_uniform("model", Mat4::IDENTITY);

    assert!(!program.has_uniform("model"));
  }

  #[test]
  fn draw_requires_use()
  {
    let mut program = linked_program();

    assert!(matches!(program.draw(0..36), Err(ShaderError::NotInUse)));
    assert!(program.finish_frame().is_none());
  }

  #[test]
  fn records_uniform_snapshots_per_draw()
  {
    let mut program = linked_program();
    program.set_uniform("projection", Mat4::IDENTITY);
    program.use_program().unwrap();

    for i in 0..3
    {
      program.set_uniform("model", Mat4::from_translation(Vec3::X * i as f32));
      program.draw(0..36).unwrap();
    }

    let frame = program.finish_frame().unwrap();

    assert_eq!(frame.draws.len(), 3);
    // camera block is unchanged across draws, object block changes each time
    assert!(frame.draws.iter().all(|d| d.offsets[0] == 0));
    let object: Vec<u32> = frame.draws.iter().map(|d| d.offsets[1]).collect();
    assert_eq!(object, vec![0, 256, 512]);
    assert!(program.finish_frame().is_none());
  }
}
