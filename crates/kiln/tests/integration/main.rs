//! Integration tests for kiln
//!
//! These tests require a reachable docker daemon and the toolchain images
//! referenced by the embedded configuration.
//! Run with: cargo test -p kiln --features integration-tests
//!
//! Tests that need the daemon are marked `#[ignore]`. To include them:
//!    cargo test -p kiln --features integration-tests -- --include-ignored

#![cfg(feature = "integration-tests")]

use kiln::{Config, Engine};

mod compilation;
mod execution;
mod lifecycle;

/// Engine whose workspaces live under an isolated per-suite directory, so
/// lifecycle tests can assert on directory contents without interference.
pub(crate) fn test_engine(tag: &str) -> Engine {
    let mut config = Config::default();
    config.workspace_root = std::env::temp_dir().join("kiln-integration").join(tag);
    Engine::new(config)
}

/// Number of workspace directories currently under the engine's root
pub(crate) fn workspace_count(engine: &Engine) -> usize {
    match std::fs::read_dir(&engine.config().workspace_root) {
        Ok(entries) => entries.filter_map(Result::ok).count(),
        Err(_) => 0,
    }
}
