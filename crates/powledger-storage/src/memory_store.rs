//! In-memory chain store for tests and benchmarks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use powledger_core::{Block, ChainError, ChainStore};

use crate::codec::{decode_block, encode_block};
use crate::KEY_TIP;

/// Volatile store with the same key layout as `SledStore`.
///
/// Both writes of a commit happen under one write lock, so readers never
/// observe the tip ahead of its block.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks, excluding the tip pointer.
    pub fn block_count(&self) -> Result<usize, ChainError> {
        let data = self.read()?;
        Ok(data.len() - usize::from(data.contains_key(KEY_TIP)))
    }

    pub fn contains(&self, hash: &[u8]) -> Result<bool, ChainError> {
        Ok(self.read()?.contains_key(hash))
    }

    /// Make every following `commit` fail before touching the map.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Overwrite a raw entry, bypassing the codec.
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), ChainError> {
        self.write()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>, ChainError> {
        self.data
            .read()
            .map_err(|_| ChainError::StorageRead("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>, ChainError> {
        self.data
            .write()
            .map_err(|_| ChainError::StorageWrite("memory store lock poisoned".to_string()))
    }
}

impl ChainStore for MemoryStore {
    fn tip(&self) -> Result<Option<Vec<u8>>, ChainError> {
        Ok(self.read()?.get(KEY_TIP).cloned())
    }

    fn get_block(&self, hash: &[u8]) -> Result<Option<Block>, ChainError> {
        self.read()?
            .get(hash)
            .map(|bytes| decode_block(bytes))
            .transpose()
    }

    fn commit(&self, block: &Block) -> Result<(), ChainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChainError::StorageWrite(
                "write rejected by fault injection".to_string(),
            ));
        }
        let bytes = encode_block(block)?;
        let mut data = self.write()?;
        data.insert(block.hash.clone(), bytes);
        data.insert(KEY_TIP.to_vec(), block.hash.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), ChainError> {
        Ok(())
    }
}
