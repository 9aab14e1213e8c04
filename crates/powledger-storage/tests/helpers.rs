#![allow(dead_code)]

use std::fs;
use std::sync::Arc;

use powledger_core::{Chain, PowConfig};
use powledger_storage::{MemoryStore, SledStore};
use tempfile::{tempdir, TempDir};

pub const TEST_DIFFICULTY: u32 = 8;

pub fn test_config() -> PowConfig {
    PowConfig::new(TEST_DIFFICULTY).expect("valid difficulty")
}

pub fn create_temp_dir() -> (TempDir, std::path::PathBuf) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("chain.db");
    (temp_dir, db_path)
}

pub fn create_temp_store() -> (TempDir, SledStore) {
    let (temp_dir, db_path) = create_temp_dir();
    (
        temp_dir,
        SledStore::open(&db_path).expect("Failed to open SledStore"),
    )
}

pub fn create_temp_chain() -> (TempDir, Chain<SledStore>) {
    let (temp_dir, store) = create_temp_store();
    let chain = Chain::open_or_create(Arc::new(store), test_config()).expect("Failed to open chain");
    (temp_dir, chain)
}

pub fn create_memory_chain() -> Chain<MemoryStore> {
    Chain::open_or_create(Arc::new(MemoryStore::new()), test_config())
        .expect("Failed to open chain")
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    store.clear().expect("Failed to clear the store");
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    // Verify the directory is removed
    assert!(!db_path.exists(), "Database directory should be removed");
}
