use std::collections::{BTreeMap, HashMap};

use glam::{Mat4, Vec3, Vec4};
use wgpu::naga;
use wgpu::naga::{AddressSpace, Binding, Scalar, TypeInner, VectorSize};

use super::stage::{CompiledStage, ShaderStage};
use super::ShaderError;

//
// ──────────────────────────────────────────────────────────────
//   Uniform values
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind
{
  F32,
  Vec3,
  Vec4,
  Mat4,
}

impl UniformKind
{
  fn from_naga(inner: &TypeInner) -> Option<Self>
  {
    match *inner
    {
      TypeInner::Scalar(scalar) if scalar == Scalar::F32 => Some(UniformKind::F32),
      TypeInner::Vector { size: VectorSize::Tri, scalar } if scalar == Scalar::F32 =>
      {
        Some(UniformKind::Vec3)
      }
      TypeInner::Vector { size: VectorSize::Quad, scalar } if scalar == Scalar::F32 =>
      {
        Some(UniformKind::Vec4)
      }
      TypeInner::Matrix { columns: VectorSize::Quad, rows: VectorSize::Quad, scalar }
        if scalar == Scalar::F32 =>
      {
        Some(UniformKind::Mat4)
      }
      _ => None,
    }
  }

  #[cfg(test)]
  pub fn size(self) -> usize
  {
    match self
    {
      UniformKind::F32 => 4,
      UniformKind::Vec3 => 12,
      UniformKind::Vec4 => 16,
      UniformKind::Mat4 => 64,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue
{
  F32(f32),
  Vec3(Vec3),
  Vec4(Vec4),
  Mat4(Mat4),
}

impl UniformValue
{
  pub fn kind(&self) -> UniformKind
  {
    match self
    {
      UniformValue::F32(_) => UniformKind::F32,
      UniformValue::Vec3(_) => UniformKind::Vec3,
      UniformValue::Vec4(_) => UniformKind::Vec4,
      UniformValue::Mat4(_) => UniformKind::Mat4,
    }
  }

  /// Column-major, little-endian bytes as laid out in a uniform buffer.
  pub fn as_bytes(&self) -> &[u8]
  {
    match self
    {
      UniformValue::F32(v) => bytemuck::bytes_of(v),
      UniformValue::Vec3(v) => bytemuck::bytes_of(v),
      UniformValue::Vec4(v) => bytemuck::bytes_of(v),
      UniformValue::Mat4(v) => bytemuck::bytes_of(v),
    }
  }
}

impl From<f32> for UniformValue
{
  fn from(v: f32) -> Self
  {
    UniformValue::F32(v)
  }
}

impl From<Vec3> for UniformValue
{
  fn from(v: Vec3) -> Self
  {
    UniformValue::Vec3(v)
  }
}

impl From<Vec4> for UniformValue
{
  fn from(v: Vec4) -> Self
  {
    UniformValue::Vec4(v)
  }
}

impl From<Mat4> for UniformValue
{
  fn from(v: Mat4) -> Self
  {
    UniformValue::Mat4(v)
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Reflected layout
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub struct UniformField
{
  pub name: String,
  pub offset: u32,
  pub kind: UniformKind,
}

/// One `var<uniform>` binding that at least one entry point reads.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock
{
  pub name: String,
  pub group: u32,
  pub binding: u32,
  pub size: u32,
  pub fields: Vec<UniformField>,
  pub visibility: wgpu::ShaderStages,
}

impl UniformBlock
{
  fn same_layout(&self, other: &UniformBlock) -> bool
  {
    self.size == other.size && self.fields == other.fields
  }
}

/// A user-defined `@location` on a stage boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceVar
{
  pub location: u32,
  pub name: Option<String>,
  pub ty: TypeInner,
}

#[derive(Debug, Clone, Default)]
pub struct StageReflection
{
  pub blocks: Vec<UniformBlock>,
  pub inputs: Vec<InterfaceVar>,
  pub outputs: Vec<InterfaceVar>,
  /// Resource bindings other than uniform buffers; the program model has no
  /// way to feed them.
  pub unsupported: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformLocation
{
  pub block: usize,
  pub offset: u32,
  pub kind: UniformKind,
}

/// Result of a successful link: blocks sorted by (group, binding), a name
/// table into them, and the vertex inputs the mesh has to provide.
#[derive(Debug, Clone)]
pub struct LinkedLayout
{
  pub blocks: Vec<UniformBlock>,
  pub vertex_inputs: Vec<InterfaceVar>,
  names: HashMap<String, UniformLocation>,
}

impl LinkedLayout
{
  pub fn uniform(&self, name: &str) -> Option<UniformLocation>
  {
    self.names.get(name).copied()
  }

  pub fn group_count(&self) -> u32
  {
    self.blocks.iter().map(|b| b.group + 1).max().unwrap_or(0)
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Stage reflection
// ──────────────────────────────────────────────────────────────
//

pub fn reflect_stage(
  module: &naga::Module,
  info: &naga::valid::ModuleInfo,
  ep_index: usize,
  stage: ShaderStage,
) -> StageReflection
{
  let entry = &module.entry_points[ep_index];
  let usage = info.get_entry_point(ep_index);
  let mut reflection = StageReflection::default();

  for (handle, var) in module.global_variables.iter()
  {
    let Some(binding) = &var.binding
    else
    {
      continue;
    };

    // Skip globals the entry point never touches, like a GL optimizer would
    if usage[handle].is_empty()
    {
      continue;
    }

    let name =
      var.name.clone().unwrap_or_else(|| format!("binding_{}_{}", binding.group, binding.binding));

    if var.space != AddressSpace::Uniform
    {
      reflection.unsupported.push(format!(
        "`{name}` at @group({}) @binding({}) is not a uniform buffer",
        binding.group, binding.binding
      ));
      continue;
    }

    let inner = &module.types[var.ty].inner;
    let fields = match inner
    {
      TypeInner::Struct { members, .. } => members
        .iter()
        .filter_map(|member| {
          let kind = UniformKind::from_naga(&module.types[member.ty].inner)?;
          Some(UniformField { name: member.name.clone()?, offset: member.offset, kind })
        })
        .collect(),
      other => UniformKind::from_naga(other)
        .map(|kind| vec![UniformField { name: name.clone(), offset: 0, kind }])
        .unwrap_or_default(),
    };

    reflection.blocks.push(UniformBlock {
      name,
      group: binding.group,
      binding: binding.binding,
      size: inner.size(module.to_ctx()),
      fields,
      visibility: stage.visibility(),
    });
  }

  for arg in &entry.function.arguments
  {
    collect_interface(module, arg.ty, arg.binding.as_ref(), arg.name.as_deref(), &mut reflection.inputs);
  }

  if let Some(result) = &entry.function.result
  {
    collect_interface(module, result.ty, result.binding.as_ref(), None, &mut reflection.outputs);
  }

  reflection
}

fn collect_interface(
  module: &naga::Module,
  ty: naga::Handle<naga::Type>,
  binding: Option<&Binding>,
  name: Option<&str>,
  out: &mut Vec<InterfaceVar>,
)
{
  match binding
  {
    Some(Binding::Location { location, .. }) => out.push(InterfaceVar {
      location: *location,
      name: name.map(str::to_string),
      ty: module.types[ty].inner.clone(),
    }),
    Some(Binding::BuiltIn(_)) =>
    {}
    None =>
    {
      if let TypeInner::Struct { members, .. } = &module.types[ty].inner
      {
        for member in members
        {
          collect_interface(module, member.ty, member.binding.as_ref(), member.name.as_deref(), out);
        }
      }
    }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Linking
// ──────────────────────────────────────────────────────────────
//

pub fn link_stages(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<LinkedLayout, ShaderError>
{
  let link_error = |msg: String| -> Result<LinkedLayout, ShaderError> { Err(ShaderError::Link(msg)) };

  for stage in [vertex, fragment]
  {
    if let Some(problem) = stage.reflection.unsupported.first()
    {
      return link_error(format!("{} stage `{}`: {problem}", stage.stage, stage.label));
    }
  }

  // Every fragment input has to be written by the vertex stage
  for input in &fragment.reflection.inputs
  {
    let produced = vertex.reflection.outputs.iter().find(|out| out.location == input.location);

    match produced
    {
      None =>
      {
        return link_error(format!(
          "fragment input @location({}) is not written by the vertex stage",
          input.location
        ))
      }
      Some(out) if out.ty != input.ty =>
      {
        return link_error(format!(
          "@location({}) is {:?} in the vertex stage but {:?} in the fragment stage",
          input.location, out.ty, input.ty
        ))
      }
      Some(_) =>
      {}
    }
  }

  let mut merged: BTreeMap<(u32, u32), UniformBlock> = BTreeMap::new();

  for block in vertex.reflection.blocks.iter().chain(&fragment.reflection.blocks)
  {
    match merged.get_mut(&(block.group, block.binding))
    {
      Some(existing) if existing.same_layout(block) => existing.visibility |= block.visibility,
      Some(existing) =>
      {
        return link_error(format!(
          "@group({}) @binding({}) is declared as `{}` and `{}` with different layouts",
          block.group, block.binding, existing.name, block.name
        ))
      }
      None =>
      {
        merged.insert((block.group, block.binding), block.clone());
      }
    }
  }

  let blocks: Vec<UniformBlock> = merged.into_values().collect();
  let mut names = HashMap::new();

  for (index, block) in blocks.iter().enumerate()
  {
    for field in &block.fields
    {
      let location = UniformLocation { block: index, offset: field.offset, kind: field.kind };

      if names.insert(field.name.clone(), location).is_some()
      {
        return link_error(format!("uniform `{}` is declared in more than one block", field.name));
      }
    }
  }

  Ok(LinkedLayout { blocks, vertex_inputs: vertex.reflection.inputs.clone(), names })
}
