use crate::codec::{decode_block, encode_block};
use crate::KEY_TIP;
use powledger_core::constants::HASH_SIZE;
use powledger_core::{Block, ChainError, ChainStore};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, IVec, Tree};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const TREE_BLOCKS: &str = "blocks";

/// Durable chain store. Blocks and the tip pointer share one tree so an
/// append is a single sled transaction.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
  blocks: Tree,
  fail_writes: Arc<AtomicBool>,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ChainError> {
    let path = path.as_ref();
    let db = sled::open(path)
      .map_err(|e| ChainError::StorageInit(format!("open {}: {e}", path.display())))?;
    let blocks = db
      .open_tree(TREE_BLOCKS)
      .map_err(|e| ChainError::StorageInit(format!("open tree {TREE_BLOCKS}: {e}")))?;
    let store = Self {
      db,
      blocks,
      fail_writes: Arc::default(),
    };
    store.reconcile()?;
    info!(path = %path.display(), blocks = store.block_count()?, "sled store opened");
    Ok(store)
  }

  /// An empty tree is a fresh store. Otherwise the tip must be present and
  /// name a stored block.
  fn reconcile(&self) -> Result<(), ChainError> {
    let tip = self
      .blocks
      .get(KEY_TIP)
      .map_err(|e| ChainError::StorageInit(e.to_string()))?;
    match tip {
      None if self.blocks.is_empty() => Ok(()),
      None => Err(ChainError::StorageInit(
        "blocks present without a tip pointer".to_string(),
      )),
      Some(tip) if tip.len() != HASH_SIZE => Err(ChainError::StorageInit(format!(
        "tip pointer has {} bytes, expected {HASH_SIZE}",
        tip.len()
      ))),
      Some(tip) => {
        let present = self
          .blocks
          .contains_key(&tip)
          .map_err(|e| ChainError::StorageInit(e.to_string()))?;
        if present {
          Ok(())
        } else {
          Err(ChainError::StorageInit(format!(
            "tip {} references a missing block",
            hex::encode(&tip)
          )))
        }
      }
    }
  }

  /// Number of stored blocks, excluding the tip pointer.
  pub fn block_count(&self) -> Result<usize, ChainError> {
    let tip = self
      .blocks
      .contains_key(KEY_TIP)
      .map_err(|e| ChainError::StorageRead(e.to_string()))?;
    Ok(self.blocks.len() - usize::from(tip))
  }

  pub fn contains(&self, hash: &[u8]) -> Result<bool, ChainError> {
    self
      .blocks
      .contains_key(hash)
      .map_err(|e| ChainError::StorageRead(e.to_string()))
  }

  /// Make every following `commit` abort inside its transaction.
  pub fn fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  pub fn clear(&self) -> Result<(), ChainError> {
    self
      .blocks
      .clear()
      .map_err(|e| ChainError::StorageWrite(e.to_string()))?;
    self.flush()
  }
}

impl ChainStore for SledStore {
  fn tip(&self) -> Result<Option<Vec<u8>>, ChainError> {
    Ok(
      self
        .blocks
        .get(KEY_TIP)
        .map_err(|e| ChainError::StorageRead(e.to_string()))?
        .map(|v: IVec| v.to_vec()),
    )
  }

  fn get_block(&self, hash: &[u8]) -> Result<Option<Block>, ChainError> {
    let opt = self
      .blocks
      .get(hash)
      .map_err(|e| ChainError::StorageRead(e.to_string()))?;
    opt.map(|ivec: IVec| decode_block(&ivec)).transpose()
  }

  fn commit(&self, block: &Block) -> Result<(), ChainError> {
    let bytes = encode_block(block)?;
    let hash = block.hash.as_slice();
    let fail = self.fail_writes.load(Ordering::SeqCst);

    let result = self.blocks.transaction(|tx| {
      tx.insert(hash, bytes.as_slice())?;
      tx.insert(KEY_TIP, hash)?;
      if fail {
        return Err(ConflictableTransactionError::Abort(()));
      }
      Ok(())
    });

    result.map_err(|e| match e {
      TransactionError::Abort(()) => {
        ChainError::StorageWrite("transaction aborted by fault injection".to_string())
      }
      TransactionError::Storage(e) => ChainError::StorageWrite(e.to_string()),
    })?;

    self
      .blocks
      .flush()
      .map_err(|e| ChainError::StorageWrite(e.to_string()))?;
    debug!(hash = %hex::encode(hash), "block committed");
    Ok(())
  }

  fn flush(&self) -> Result<(), ChainError> {
    self
      .db
      .flush()
      .map(|_| ())
      .map_err(|e| ChainError::StorageWrite(e.to_string()))
  }
}
