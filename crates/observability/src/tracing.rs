//! `tracing-subscriber` construction.

use tracing_subscriber::EnvFilter;

/// JSON lines, one per event, filtered by `RUST_LOG` (default `info`).
///
/// A subscriber that is already installed is left in place.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Plain-text subscriber writing through the test writer.
///
/// Defaults to `debug` so entity-tag comparisons show up in failing tests.
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
