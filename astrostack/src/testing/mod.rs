//! Testing utilities for astrostack.

#![allow(dead_code)]

pub use crate::synthetic;

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    common::log_setup::init_test_logging();
}

/// Per-test scratch directory under the system temp dir, emptied first.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("astrostack_tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Number of entries in `dir`; 0 when it does not exist.
pub fn count_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}
