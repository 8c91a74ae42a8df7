//! Common test utilities for the potlog crate.
//!
//! - `cli`: runner for the `potlog` binary with fluent assertions
//! - `env`: serialized environment variable overrides
#![allow(dead_code)]


use std::path::PathBuf;

use potlog::store::ReadingStore;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A freshly initialized store inside its own temp directory.
///
/// Keep the `TempDir` alive for as long as the store is used.
///
/// # Panics
///
/// Panics if the temp directory or store cannot be created.
#[must_use]
pub fn fresh_store() -> (TempDir, ReadingStore) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("readings.db");
    ReadingStore::initialize(&path).expect("initialize store");
    (dir, ReadingStore::new(path))
}

/// Path for a store that has not been created yet.
#[must_use]
pub fn absent_store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("missing.db")
}
