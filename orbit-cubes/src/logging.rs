use std::io::Write;
use std::sync::Once;

/// Used when `RUST_LOG` is unset. Keeps wgpu's own chatter out of the console.
pub const DEFAULT_FILTER: &str = "info,wgpu_hal=off,wgpu_core=warn,naga=warn";

static INIT: Once = Once::new();

/// Initialise the global logger once; later calls are ignored.
///
/// Records carry `file:line` so fatal startup errors point at the failing
/// step.
pub fn init_logging()
{
  INIT.call_once(|| {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&filter_spec(std::env::var("RUST_LOG").ok()));

    builder.format(|buf, record| {
      writeln!(
        buf,
        "{:<5} [{}:{}] {}",
        record.level(),
        record.file().unwrap_or("?"),
        record.line().unwrap_or(0),
        record.args()
      )
    });

    builder.init();

    log::debug!("logging initialized");
  });
}

fn filter_spec(rust_log: Option<String>) -> String
{
  match rust_log
  {
    Some(filter) if !filter.trim().is_empty() => filter,
    _ => DEFAULT_FILTER.to_string(),
  }
}
