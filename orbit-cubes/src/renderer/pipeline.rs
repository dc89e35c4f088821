use std::borrow::Cow;
use std::num::NonZeroU64;
use std::ops::Range;

use wgpu::naga::{Scalar, TypeInner, VectorSize};

use crate::shader::{
  align_to, InterfaceVar, RecordedFrame, ShaderError, ShaderProgram, ShaderStage, UniformBlock,
  UNIFORM_ALIGNMENT,
};

use super::depth::DEPTH_FORMAT;

//
// ──────────────────────────────────────────────────────────────
//   GpuProgram
//
//   GPU half of a linked ShaderProgram: the render pipeline, one
//   growable uniform buffer per block, and one bind group per
//   @group. Every uniform binding uses a dynamic offset so each
//   recorded draw can point at its own snapshot.
// ──────────────────────────────────────────────────────────────
//

const INITIAL_SLOTS: u64 = 32;

struct UniformBuffer
{
  buffer: wgpu::Buffer,
  capacity: u64,
  binding_size: u64,
}

struct GroupBinding
{
  layout: wgpu::BindGroupLayout,
  bind_group: wgpu::BindGroup,
  /// Indices into the linked blocks, ordered by binding.
  blocks: Range<usize>,
}

pub struct GpuProgram
{
  pipeline: wgpu::RenderPipeline,
  blocks: Vec<UniformBlock>,
  buffers: Vec<UniformBuffer>,
  groups: Vec<GroupBinding>,
}

//
// ──────────────────────────────────────────────────────────────
//   Public API
// ──────────────────────────────────────────────────────────────
//

impl GpuProgram
{
  pub fn create(
    device: &wgpu::Device,
    program: &ShaderProgram,
    color_format: wgpu::TextureFormat,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
  ) -> Result<Self, ShaderError>
  {
    let layout = program.layout().ok_or(ShaderError::NotLinked)?;
    let vertex = program.stage(ShaderStage::Vertex).ok_or(ShaderError::NotLinked)?;
    let fragment = program.stage(ShaderStage::Fragment).ok_or(ShaderError::NotLinked)?;

    check_vertex_inputs(&layout.vertex_inputs, vertex_layout.attributes)?;

    let blocks = layout.blocks.clone();
    let buffers: Vec<UniformBuffer> =
      blocks.iter().map(|block| create_uniform_buffer(device, block, INITIAL_SLOTS)).collect();

    let groups: Vec<GroupBinding> = (0..layout.group_count())
      .map(|group| {
        let range = group_range(&blocks, group);
        let bgl = create_group_layout(device, group, &blocks[range.clone()]);
        let bind_group = create_bind_group(device, &bgl, &blocks, &buffers, range.clone());
        GroupBinding { layout: bgl, bind_group, blocks: range }
      })
      .collect();

    let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some(&vertex.label),
      source: wgpu::ShaderSource::Naga(Cow::Owned(vertex.module.clone())),
    });

    let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some(&fragment.label),
      source: wgpu::ShaderSource::Naga(Cow::Owned(fragment.module.clone())),
    });

    let bgl_refs: Vec<&wgpu::BindGroupLayout> = groups.iter().map(|g| &g.layout).collect();

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("Program Pipeline Layout"),
      bind_group_layouts: &bgl_refs,
      push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Program Pipeline"),
      layout: Some(&pipeline_layout),
      vertex: wgpu::VertexState {
        module: &vs_module,
        entry_point: Some(&vertex.entry_point),
        buffers: &[vertex_layout],
        compilation_options: wgpu::PipelineCompilationOptions::default(),
      },
      fragment: Some(wgpu::FragmentState {
        module: &fs_module,
        entry_point: Some(&fragment.entry_point),
        targets: &[Some(wgpu::ColorTargetState {
          format: color_format,
          blend: Some(wgpu::BlendState::REPLACE),
          write_mask: wgpu::ColorWrites::ALL,
        })],
        compilation_options: wgpu::PipelineCompilationOptions::default(),
      }),
      primitive: wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None, // both windings are drawn
        unclipped_depth: false,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
      },
      depth_stencil: Some(wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
      }),
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    Ok(Self { pipeline, blocks, buffers, groups })
  }

  /// Copy the frame's uniform arenas to the GPU, growing buffers first if
  /// the frame needs more slots than they hold.
  pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &RecordedFrame)
  {
    let mut regrouped = Vec::new();

    for (index, arena) in frame.arenas.iter().enumerate()
    {
      let needed = arena.len() as u64;

      if needed > self.buffers[index].capacity
      {
        let slots = (needed / slot_size(&self.blocks[index])).next_power_of_two();
        log::debug!("growing uniform buffer `{}` to {slots} slots", self.blocks[index].name);

        self.buffers[index] = create_uniform_buffer(device, &self.blocks[index], slots);
        regrouped.push(self.blocks[index].group as usize);
      }

      if !arena.is_empty()
      {
        queue.write_buffer(&self.buffers[index].buffer, 0, arena);
      }
    }

    regrouped.dedup();

    for group in regrouped
    {
      let binding = &self.groups[group];
      let bind_group =
        create_bind_group(device, &binding.layout, &self.blocks, &self.buffers, binding.blocks.clone());
      self.groups[group].bind_group = bind_group;
    }
  }

  /// Replay the recorded draws. The caller has bound the vertex buffer.
  pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, frame: &RecordedFrame)
  {
    pass.set_pipeline(&self.pipeline);

    for command in &frame.draws
    {
      for (group, binding) in self.groups.iter().enumerate()
      {
        let offsets = &command.offsets[binding.blocks.clone()];
        pass.set_bind_group(group as u32, &binding.bind_group, offsets);
      }

      pass.draw(command.vertices.clone(), 0..1);
    }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Resource helpers
// ──────────────────────────────────────────────────────────────
//

fn slot_size(block: &UniformBlock) -> u64
{
  align_to(block.size, UNIFORM_ALIGNMENT) as u64
}

fn create_uniform_buffer(device: &wgpu::Device, block: &UniformBlock, slots: u64) -> UniformBuffer
{
  let capacity = slot_size(block) * slots.max(1);

  let buffer = device.create_buffer(&wgpu::BufferDescriptor {
    label: Some(&format!("Uniform Buffer `{}`", block.name)),
    size: capacity,
    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    mapped_at_creation: false,
  });

  UniformBuffer { buffer, capacity, binding_size: block.size as u64 }
}

/// Blocks are sorted by (group, binding), so each group is a contiguous run.
fn group_range(blocks: &[UniformBlock], group: u32) -> Range<usize>
{
  let start = blocks.partition_point(|b| b.group < group);
  let end = blocks.partition_point(|b| b.group <= group);
  start..end
}

fn create_group_layout(device: &wgpu::Device, group: u32, blocks: &[UniformBlock]) -> wgpu::BindGroupLayout
{
  let entries: Vec<wgpu::BindGroupLayoutEntry> = blocks
    .iter()
    .map(|block| wgpu::BindGroupLayoutEntry {
      binding: block.binding,
      visibility: block.visibility,
      ty: wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: true,
        min_binding_size: NonZeroU64::new(block.size as u64),
      },
      count: None,
    })
    .collect();

  device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
    label: Some(&format!("Uniform BGL {group}")),
    entries: &entries,
  })
}

fn create_bind_group(
  device: &wgpu::Device,
  layout: &wgpu::BindGroupLayout,
  blocks: &[UniformBlock],
  buffers: &[UniformBuffer],
  range: Range<usize>,
) -> wgpu::BindGroup
{
  let entries: Vec<wgpu::BindGroupEntry> = range
    .map(|index| wgpu::BindGroupEntry {
      binding: blocks[index].binding,
      resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
        buffer: &buffers[index].buffer,
        offset: 0,
        size: NonZeroU64::new(buffers[index].binding_size),
      }),
    })
    .collect();

  device.create_bind_group(&wgpu::BindGroupDescriptor { label: Some("Uniform BG"), layout, entries: &entries })
}

//
// ──────────────────────────────────────────────────────────────
//   Vertex input check
// ──────────────────────────────────────────────────────────────
//

fn vertex_format(ty: &TypeInner) -> Option<wgpu::VertexFormat>
{
  match *ty
  {
    TypeInner::Scalar(scalar) if scalar == Scalar::F32 => Some(wgpu::VertexFormat::Float32),
    TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => Some(match size
    {
      VectorSize::Bi => wgpu::VertexFormat::Float32x2,
      VectorSize::Tri => wgpu::VertexFormat::Float32x3,
      VectorSize::Quad => wgpu::VertexFormat::Float32x4,
    }),
    _ => None,
  }
}

/// Every vertex-stage input must be fed by a mesh attribute of the same
/// location and format.
pub fn check_vertex_inputs(inputs: &[InterfaceVar], attributes: &[wgpu::VertexAttribute]) -> Result<(), ShaderError>
{
  for input in inputs
  {
    let attribute = attributes.iter().find(|a| a.shader_location == input.location);

    match (attribute, vertex_format(&input.ty))
    {
      (Some(attribute), Some(format)) if attribute.format == format =>
      {}
      (Some(attribute), _) =>
      {
        return Err(ShaderError::Link(format!(
          "vertex input @location({}) is {:?} but the mesh provides {:?}",
          input.location, input.ty, attribute.format
        )))
      }
      (None, _) =>
      {
        return Err(ShaderError::Link(format!(
          "vertex input @location({}) has no matching mesh attribute",
          input.location
        )))
      }
    }
  }

  Ok(())
}
