//! Logging setup for the petstore binary and its tests.

/// Install the JSON subscriber used by the server binary.
///
/// Only the first call in a process installs anything.
pub fn init() {
    tracing::init();
}

/// Install a plain-text subscriber that writes through the test harness.
pub fn init_for_tests() {
    tracing::init_for_tests();
}

pub mod tracing;
