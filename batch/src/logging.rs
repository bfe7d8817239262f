//! Diagnostic tracing for the batch driver.
//!
//! Tracing output goes to stderr and is controlled by `RUST_LOG`. The progress
//! lines and summary printed to stdout are product output and are not
//! affected by it.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset.
///
/// # Example
/// ```bash
/// RUST_LOG=mjai_batch=debug mjai-batch 2023 --month 02
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
