mod app;
mod camera;
mod config;
mod error;
mod frame;
mod input;
mod logging;
mod renderer;
mod shader;

fn main() -> anyhow::Result<()>
{
  // Set RUST_LOG (e.g. RUST_LOG=debug or RUST_LOG=wgpu=debug) for more output.
  logging::init_logging();

  let config = config::load()?;

  app::run(config)
}
