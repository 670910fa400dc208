use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with a stderr layer and a daily-rolling file appender.
///
/// Returns the guard that flushes the file writer; keep it alive for the
/// lifetime of the embedder.
pub fn init_logging() -> WorkerGuard {
  let log_dir = dirs::data_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("swkit")
    .join("logs");
  let _ = std::fs::create_dir_all(&log_dir);

  let file_appender = tracing_appender::rolling::daily(&log_dir, "swkit");
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  // File layer: no ANSI colors
  let file_layer = fmt::layer()
    .with_writer(non_blocking)
    .with_ansi(false)
    .with_target(true);

  let stderr_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_ansi(true)
    .with_target(false);

  tracing_subscriber::registry()
    .with(filter)
    .with(file_layer)
    .with(stderr_layer)
    .init();

  guard
}
