#![allow(dead_code)]

use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;
use yabt::storage::DocumentStore;

pub mod cli;
pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        yabt::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

pub fn test_store() -> DocumentStore {
    init_test_logging();
    DocumentStore::open_memory().expect("Failed to create test store")
}

pub fn test_store_with_dir() -> (DocumentStore, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("data").join("yabt.db");
    let store = DocumentStore::open(&db_path).expect("Failed to create test store");
    (store, dir)
}
