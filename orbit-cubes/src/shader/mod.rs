//! Shader program helper: compile WGSL stages, link them into a program,
//! upload named uniforms and record draws against the program.
//!
//! Everything in here runs on the CPU. Shaders are parsed and validated with
//! naga, and the uniform layout is reflected from the validated module. The
//! renderer turns a linked program into GPU objects.

mod error;
mod program;
mod reflect;
mod stage;
mod uniforms;

pub use error::ShaderError;
pub use program::ShaderProgram;
pub use reflect::{InterfaceVar, UniformBlock};
pub use stage::ShaderStage;
pub use uniforms::{align_to, RecordedFrame, UNIFORM_ALIGNMENT};
