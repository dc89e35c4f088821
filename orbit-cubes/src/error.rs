use std::path::PathBuf;

use crate::shader::ShaderError;

/// Startup failures. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum InitError
{
  #[error("could not create the event loop: {0}")]
  EventLoop(#[from] winit::error::EventLoopError),

  #[error("could not create a window: {0}")]
  Window(#[from] winit::error::OsError),

  #[error("could not create a surface: {0}")]
  Surface(#[from] wgpu::CreateSurfaceError),

  #[error("no suitable GPU adapter: {0}")]
  Adapter(#[from] wgpu::RequestAdapterError),

  #[error("could not create a GPU device: {0}")]
  Device(#[from] wgpu::RequestDeviceError),

  #[error("surface is not supported by the adapter")]
  UnsupportedSurface,

  #[error("unknown variant `{0}` (expected rubik, single or static)")]
  UnknownVariant(String),

  #[error("could not read config {path:?}: {source}")]
  ConfigRead
  {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid config {path:?}: {source}")]
  ConfigParse
  {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid config override: {0}")]
  ConfigMerge(#[source] serde_json::Error),

  #[error(transparent)]
  Shader(#[from] ShaderError),
}
