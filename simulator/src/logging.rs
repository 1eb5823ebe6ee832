//! Development-time tracing for the simulator.
//!
//! Diagnostics only: result publication goes through listeners, never
//! through this output. Reads `RUST_LOG`; defaults to `warn`. Output goes to
//! stderr in compact format so stdout stays reserved for result lines.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for development logging.
///
/// # Example
/// ```bash
/// RUST_LOG=simulator=debug,engine=debug cargo run -- run module scenario.toml
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
