use std::ops::Range;

use super::reflect::UniformBlock;

//
// ──────────────────────────────────────────────────────────────
//   Uniform storage
//
//   Every active block keeps a CPU copy of its bytes. While the
//   program is in use, each draw snapshots the blocks that changed
//   since the previous draw into a per-frame arena; the draw then
//   refers to its snapshot by dynamic offset.
// ──────────────────────────────────────────────────────────────
//

/// wgpu's default `min_uniform_buffer_offset_alignment`.
pub const UNIFORM_ALIGNMENT: u32 = 256;

pub fn align_to(value: u32, alignment: u32) -> u32
{
  value.div_ceil(alignment) * alignment
}

#[derive(Debug, Default)]
pub struct UniformStore
{
  blocks: Vec<BlockData>,
}

#[derive(Debug)]
struct BlockData
{
  bytes: Vec<u8>,
  dirty: bool,
}

impl UniformStore
{
  pub fn new(blocks: &[UniformBlock]) -> Self
  {
    let blocks = blocks
      .iter()
      .map(|block| BlockData { bytes: vec![0; block.size as usize], dirty: true })
      .collect();

    Self { blocks }
  }

  pub fn write(&mut self, block: usize, offset: u32, value: &[u8])
  {
    let data = &mut self.blocks[block];
    let start = offset as usize;

    data.bytes[start..start + value.len()].copy_from_slice(value);
    data.dirty = true;
  }

  #[cfg(test)]
  pub fn bytes(&self, block: usize) -> &[u8]
  {
    &self.blocks[block].bytes
  }

  pub fn block_count(&self) -> usize
  {
    self.blocks.len()
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Frame recording
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand
{
  pub vertices: Range<u32>,
  /// Dynamic offset into each block's arena, indexed like the linked blocks.
  pub offsets: Vec<u32>,
}

/// Everything the GPU needs to replay one frame of a program.
#[derive(Debug, Clone, Default)]
pub struct RecordedFrame
{
  pub arenas: Vec<Vec<u8>>,
  pub draws: Vec<DrawCommand>,
}

#[derive(Debug)]
pub struct Recording
{
  frame: RecordedFrame,
  current: Vec<Option<u32>>,
}

impl Recording
{
  pub fn new(block_count: usize) -> Self
  {
    Self {
      frame: RecordedFrame { arenas: vec![Vec::new(); block_count], draws: Vec::new() },
      current: vec![None; block_count],
    }
  }

  pub fn record(&mut self, store: &mut UniformStore, vertices: Range<u32>)
  {
    let mut offsets = Vec::with_capacity(store.blocks.len());

    for (index, block) in store.blocks.iter_mut().enumerate()
    {
      let offset = match self.current[index]
      {
        Some(offset) if !block.dirty => offset,
        _ => snapshot(&mut self.frame.arenas[index], &block.bytes),
      };

      block.dirty = false;
      self.current[index] = Some(offset);
      offsets.push(offset);
    }

    self.frame.draws.push(DrawCommand { vertices, offsets });
  }

  pub fn finish(self) -> RecordedFrame
  {
    self.frame
  }
}

fn snapshot(arena: &mut Vec<u8>, bytes: &[u8]) -> u32
{
  let offset = arena.len() as u32;
  let slot = align_to(bytes.len().max(1) as u32, UNIFORM_ALIGNMENT) as usize;

  arena.extend_from_slice(bytes);
  arena.resize(offset as usize + slot, 0);

  offset
}

#[cfg(test)]
mod tests
{
  use super::*;

  fn block(size: u32) -> UniformBlock
  {
    UniformBlock {
      name: format!("block_{size}"),
      group: 0,
      binding: 0,
      size,
      fields: Vec::new(),
      visibility: wgpu::ShaderStages::VERTEX,
    }
  }

  #[test]
  fn alignment()
  {
    assert_eq!(align_to(0, 256), 0);
    assert_eq!(align_to(1, 256), 256);
    assert_eq!(align_to(256, 256), 256);
    assert_eq!(align_to(257, 256), 512);
  }

  #[test]
  fn unchanged_blocks_share_a_slot()
  {
    let mut store = UniformStore::new(&[block(128), block(64)]);
    let mut recording = Recording::new(store.block_count());

    recording.record(&mut store, 0..36);
    recording.record(&mut store, 0..36);

    let frame = recording.finish();

    assert_eq!(frame.draws.len(), 2);
    assert_eq!(frame.draws[0].offsets, vec![0, 0]);
    assert_eq!(frame.draws[1].offsets, vec![0, 0]);
    assert_eq!(frame.arenas[0].len(), 256);
    assert_eq!(frame.arenas[1].len(), 256);
  }

  #[test]
  fn changed_block_gets_a_new_aligned_slot()
  {
    let mut store = UniformStore::new(&[block(128), block(64)]);
    let mut recording = Recording::new(store.block_count());

    recording.record(&mut store, 0..36);
    store.write(1, 0, &[7, 7, 7, 7]);
    recording.record(&mut store, 0..36);

    let frame = recording.finish();

    assert_eq!(frame.draws[1].offsets, vec![0, 256]);
    assert_eq!(&frame.arenas[1][256..260], &[7, 7, 7, 7]);
    assert_eq!(&frame.arenas[1][0..4], &[0, 0, 0, 0]);
  }

  #[test]
  fn new_recording_snapshots_every_block_again()
  {
    let mut store = UniformStore::new(&[block(64)]);

    let mut first = Recording::new(1);
    first.record(&mut store, 0..3);
    first.finish();

    let mut second = Recording::new(1);
    second.record(&mut store, 0..3);

    assert_eq!(second.finish().arenas[0].len(), 256);
  }
}
