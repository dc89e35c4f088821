mod core;
mod cube;
mod depth;
mod pipeline;

pub use self::core::Renderer;
pub use cube::CUBE_VERTEX_COUNT;
