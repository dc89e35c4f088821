use wgpu::util::DeviceExt;

//
// ──────────────────────────────────────────────────────────────
//   Vertex layout: position (location 0), colour (location 1)
// ──────────────────────────────────────────────────────────────
//

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex
{
  pub position: [f32; 3],
  pub color: [f32; 3],
}

impl CubeVertex
{
  pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x3,  // position
    1 => Float32x3,  // colour
  ];

  pub fn layout() -> wgpu::VertexBufferLayout<'static>
  {
    wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<CubeVertex>() as u64,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &Self::ATTRIBUTES,
    }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Geometry: unit cube centred on the origin, Y up
// ──────────────────────────────────────────────────────────────
//

/// 6 faces × 2 triangles × 3 vertices
pub const CUBE_VERTEX_COUNT: u32 = 36;

const CORNERS: [[f32; 3]; 8] = [
  [0.5, 0.5, 0.5],    // 0
  [0.5, 0.5, -0.5],   // 1
  [-0.5, 0.5, -0.5],  // 2
  [-0.5, 0.5, 0.5],   // 3
  [0.5, -0.5, 0.5],   // 4
  [0.5, -0.5, -0.5],  // 5
  [-0.5, -0.5, -0.5], // 6
  [-0.5, -0.5, 0.5],  // 7
];

const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
const YELLOW: [f32; 3] = [1.0, 1.0, 0.0];
const BLUE: [f32; 3] = [0.0, 0.0, 1.0];
const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const ORANGE: [f32; 3] = [1.0, 0.5, 0.0];

#[rustfmt::skip]
const FACES: [([usize; 6], [f32; 3]); 6] = [
  ([2, 1, 0,  2, 0, 3], RED),     // top     (Y+)
  ([4, 5, 6,  4, 6, 7], ORANGE),  // bottom  (Y-)
  ([0, 1, 5,  0, 5, 4], WHITE),   // right   (X+)
  ([3, 6, 7,  3, 2, 6], YELLOW),  // left    (X-)
  ([3, 0, 4,  3, 4, 7], GREEN),   // front   (Z+)
  ([1, 2, 5,  2, 6, 5], BLUE),    // back    (Z-)
];

pub fn cube_vertices() -> Vec<CubeVertex>
{
  FACES
    .iter()
    .flat_map(|(indices, color)| {
      indices.iter().map(move |&i| CubeVertex { position: CORNERS[i], color: *color })
    })
    .collect()
}

//
// ──────────────────────────────────────────────────────────────
//   CubeMesh (uploaded once, never written again)
// ──────────────────────────────────────────────────────────────
//

pub struct CubeMesh
{
  pub vertex_buffer: wgpu::Buffer,
  pub vertex_count: u32,
}

impl CubeMesh
{
  pub fn create(device: &wgpu::Device) -> Self
  {
    let vertices = cube_vertices();

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Cube Vertex Buffer"),
      contents: bytemuck::cast_slice(&vertices),
      usage: wgpu::BufferUsages::VERTEX,
    });

    Self { vertex_buffer, vertex_count: vertices.len() as u32 }
  }
}

#[cfg(test)]
mod tests
{
  use glam::Vec3;

  use super::*;

  #[test]
  fn has_36_vertices()
  {
    assert_eq!(cube_vertices().len(), CUBE_VERTEX_COUNT as usize);
  }

  #[test]
  fn corners_are_at_half_unit()
  {
    for v in cube_vertices()
    {
      assert!(v.position.iter().all(|c| c.abs() == 0.5));
    }
  }

  #[test]
  fn each_face_is_flat_and_single_coloured()
  {
    let vertices = cube_vertices();

    for face in vertices.chunks(6)
    {
      let color = face[0].color;
      assert!(face.iter().all(|v| v.color == color));

      // exactly one axis is constant across the face
      let flat_axes = (0..3)
        .filter(|&axis| face.iter().all(|v| v.position[axis] == face[0].position[axis]))
        .count();
      assert_eq!(flat_axes, 1);
    }
  }

  #[test]
  fn faces_cover_all_six_sides()
  {
    let normals: Vec<Vec3> = cube_vertices()
      .chunks(6)
      .map(|face| face.iter().map(|v| Vec3::from(v.position)).sum::<Vec3>() / 6.0)
      .map(|centre| centre * 2.0)
      .collect();

    for axis in [Vec3::X, Vec3::Y, Vec3::Z]
    {
      assert!(normals.iter().any(|n| n.abs_diff_eq(axis, 1e-6)));
      assert!(normals.iter().any(|n| n.abs_diff_eq(-axis, 1e-6)));
    }
  }

  #[test]
  fn triangles_are_not_degenerate()
  {
    for tri in cube_vertices().chunks(3)
    {
      let a = Vec3::from(tri[0].position);
      let b = Vec3::from(tri[1].position);
      let c = Vec3::from(tri[2].position);

      assert!((b - a).cross(c - a).length() > 0.1);
    }
  }
}
