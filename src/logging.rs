//! Diagnostic tracing for the `verdict` binary
//!
//! The library only emits `tracing` events (rule faults, stale discards,
//! observer panics); installing a subscriber is left to the application.
//! Validation results themselves go to stdout through `output`, never here.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset, so rule faults are shown.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=verdict=debug verdict check --rules verdict.toml --values form.toml
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // A subscriber installed by an embedding application wins
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
