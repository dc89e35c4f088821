use std::fmt;
use std::path::Path;

use wgpu::naga;

use super::reflect::{reflect_stage, StageReflection};
use super::ShaderError;

//
// ──────────────────────────────────────────────────────────────
//   Pipeline stage
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage
{
  Vertex,
  Fragment,
}

impl ShaderStage
{
  /// Infer the stage from a `.vert` / `.frag` component of the file name,
  /// e.g. `simple_mvp.vert.wgsl`.
  pub fn from_path(path: &Path) -> Option<Self>
  {
    let name = path.file_name()?.to_str()?;

    name.split('.').skip(1).find_map(|ext| match ext
    {
      "vert" => Some(ShaderStage::Vertex),
      "frag" => Some(ShaderStage::Fragment),
      _ => None,
    })
  }

  pub fn naga_stage(self) -> naga::ShaderStage
  {
    match self
    {
      ShaderStage::Vertex => naga::ShaderStage::Vertex,
      ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
  }

  pub fn visibility(self) -> wgpu::ShaderStages
  {
    match self
    {
      ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
      ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
    }
  }
}

impl fmt::Display for ShaderStage
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
  {
    match self
    {
      ShaderStage::Vertex => f.write_str("vertex"),
      ShaderStage::Fragment => f.write_str("fragment"),
    }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Compiled stage
// ──────────────────────────────────────────────────────────────
//

/// A parsed and validated WGSL module with exactly one entry point chosen
/// for its stage.
#[derive(Debug, Clone)]
pub struct CompiledStage
{
  pub label: String,
  pub stage: ShaderStage,
  pub entry_point: String,
  pub module: naga::Module,
  pub reflection: StageReflection,
}

impl CompiledStage
{
  pub fn from_source(label: &str, source: &str, stage: ShaderStage) -> Result<Self, ShaderError>
  {
    let compile_error = |message: String| ShaderError::Compile {
      label: label.to_string(),
      stage,
      message,
    };

    let module =
      naga::front::wgsl::parse_str(source).map_err(|err| compile_error(err.emit_to_string(source)))?;

    let info = naga::valid::Validator::new(
      naga::valid::ValidationFlags::all(),
      naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|err| compile_error(err.emit_to_string(source)))?;

    // First entry point of the requested stage wins
    let ep_index = module
      .entry_points
      .iter()
      .position(|ep| ep.stage == stage.naga_stage())
      .ok_or_else(|| compile_error(format!("no @{stage} entry point found")))?;

    let entry_point = module.entry_points[ep_index].name.clone();
    let reflection = reflect_stage(&module, &info, ep_index, stage);

    Ok(Self { label: label.to_string(), stage, entry_point, module, reflection })
  }
}
