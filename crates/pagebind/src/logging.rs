//! Log output setup.
//!
//! The engine only emits `tracing` events; installing a subscriber is left to
//! the test binary. [`init`] is the one-liner for the common case.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "pagebind=info";

/// Install a fmt subscriber filtered by `RUST_LOG` (falls back to
/// [`DEFAULT_FILTER`]). Returns `false` when a global subscriber already
/// exists, which makes repeated calls from several tests harmless.
pub fn init() -> bool {
    init_with_filter(DEFAULT_FILTER)
}

/// Like [`init`] with an explicit fallback filter
pub fn init_with_filter(fallback: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .is_ok()
}
