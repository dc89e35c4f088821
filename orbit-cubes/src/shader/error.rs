use std::path::PathBuf;

use super::ShaderStage;

#[derive(Debug, thiserror::Error)]
pub enum ShaderError
{
  #[error("could not read shader source {path:?}: {source}")]
  Io
  {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("could not compile {stage} shader `{label}`:\n{message}")]
  Compile
  {
    label: String,
    stage: ShaderStage,
    message: String,
  },

  #[error("could not link shader program: {0}")]
  Link(String),

  #[error("shader program has not been linked")]
  NotLinked,

  #[error("draw issued while the shader program is not in use")]
  NotInUse,
}
