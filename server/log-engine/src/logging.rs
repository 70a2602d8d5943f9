//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber on stderr, filtered by `RUST_LOG` (default "info").
///
/// stdout is left free for machine-readable output.
pub fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}
