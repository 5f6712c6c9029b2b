//! Opt-in tracing bootstrap for harnesses and local debugging.
//!
//! Library code only emits events; installing a subscriber is the host's
//! call. This helper wires the usual fmt + `RUST_LOG` env-filter stack.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the filter directive.
pub const LOG_ENV: &str = "ARBOR_LOG";

/// Install a global fmt subscriber.
///
/// The filter is read from `ARBOR_LOG`, then `RUST_LOG`, falling back to
/// `default_directive` (for example `"arbor_layout=debug"`). Returns `false`
/// when a global subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install a subscriber that writes through the test harness capture.
pub fn init_for_tests() -> bool {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init()
        .is_ok()
}
