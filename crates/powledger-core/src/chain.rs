use std::sync::Arc;

use tracing::{info, warn};

use crate::iter::ChainIterator;
use crate::pow::{mine_block, MiningControl, PowConfig, ProofOfWork};
use crate::{Block, ChainError};

/// Trait the storage backends implement for the chain to operate.
/// This lives in `powledger-core` to avoid a circular dependency.
pub trait ChainStore: Send + Sync {
    /// Current tip hash, or `None` for a store that holds no chain yet.
    fn tip(&self) -> Result<Option<Vec<u8>>, ChainError>;

    fn get_block(&self, hash: &[u8]) -> Result<Option<Block>, ChainError>;

    /// Store `block` under its hash and repoint the tip to it, atomically.
    /// An error may still leave both writes visible when only a later
    /// durability step failed. Callers re-read `tip` to tell the cases apart.
    fn commit(&self, block: &Block) -> Result<(), ChainError>;

    fn flush(&self) -> Result<(), ChainError>;
}

/// Hash-linked chain over a `ChainStore`. The single writer of its store.
pub struct Chain<S: ChainStore> {
    store: Arc<S>,
    config: PowConfig,
    tip: Vec<u8>,
}

impl<S: ChainStore> Chain<S> {
    /// Load the chain held by `store`, mining and committing a genesis block
    /// if the store is empty.
    pub fn open_or_create(store: Arc<S>, config: PowConfig) -> Result<Self, ChainError> {
        config.target()?;
        let tip = match store.tip().map_err(as_init_error)? {
            Some(tip) => {
                if store.get_block(&tip).map_err(as_init_error)?.is_none() {
                    return Err(ChainError::StorageInit(format!(
                        "tip {} references a missing block",
                        hex::encode(&tip)
                    )));
                }
                info!(tip = %hex::encode(&tip), "loaded existing chain");
                tip
            }
            None => {
                info!("no existing chain found, mining genesis block");
                let genesis = mine_block(Block::genesis(), &config, &MiningControl::default())?;
                store.commit(&genesis).map_err(as_init_error)?;
                info!(hash = %hex::encode(&genesis.hash), "genesis block stored");
                genesis.hash
            }
        };
        Ok(Self { store, config, tip })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    pub fn tip(&self) -> &[u8] {
        &self.tip
    }

    pub fn append(&mut self, data: impl Into<Vec<u8>>) -> Result<Block, ChainError> {
        self.append_with(data, &MiningControl::default())
    }

    /// Mine a block on top of the tip and commit it. The in-memory tip only
    /// moves once the store has committed.
    pub fn append_with(
        &mut self,
        data: impl Into<Vec<u8>>,
        control: &MiningControl,
    ) -> Result<Block, ChainError> {
        let candidate = Block::new(data, self.tip.clone());
        let block = mine_block(candidate, &self.config, control)?;
        if let Err(e) = self.store.commit(&block) {
            // A commit can land and still report an error. Follow the store's tip.
            if self.store.tip()?.as_deref() != Some(block.hash.as_slice()) {
                warn!(hash = %hex::encode(&block.hash), error = %e, "append failed, tip unchanged");
                return Err(match e {
                    ChainError::StorageWrite(_) => e,
                    other => ChainError::StorageWrite(other.to_string()),
                });
            }
            warn!(hash = %hex::encode(&block.hash), error = %e, "block stored but commit reported an error");
        }
        self.tip = block.hash.clone();
        info!(hash = %hex::encode(&block.hash), nonce = block.nonce, "block appended");
        Ok(block)
    }

    pub fn get(&self, hash: &[u8]) -> Result<Block, ChainError> {
        self.store
            .get_block(hash)?
            .ok_or_else(|| ChainError::not_found(hash))
    }

    pub fn iter(&self) -> ChainIterator<'_, S> {
        ChainIterator::new(self.store.as_ref(), self.tip.clone())
    }

    /// Re-run the proof-of-work check on `block` with this chain's difficulty.
    pub fn validate(&self, block: &Block) -> bool {
        ProofOfWork::new(block, &self.config)
            .map(|pow| pow.validate())
            .unwrap_or(false)
    }

    /// Walk the chain from tip to genesis checking linkage, stored digests and
    /// proofs. Returns the number of blocks.
    pub fn verify(&self) -> Result<usize, ChainError> {
        let mut expected = self.tip.clone();
        let mut count = 0usize;
        for block in self.iter() {
            let block = block?;
            if block.hash != expected {
                return Err(ChainError::invalid_block(&expected, "stored under a different hash"));
            }
            if !ProofOfWork::new(&block, &self.config)?.verify() {
                return Err(ChainError::invalid_block(&block.hash, "proof of work does not hold"));
            }
            expected = block.previous_hash;
            count += 1;
        }
        Ok(count)
    }

    /// Flush the store and release this handle.
    pub fn close(self) -> Result<(), ChainError> {
        self.store.flush()
    }
}

fn as_init_error(e: ChainError) -> ChainError {
    match e {
        ChainError::StorageInit(_) => e,
        other => ChainError::StorageInit(other.to_string()),
    }
}
