//! Proof-of-work: target derivation, nonce search and validation.
//!
//! A block is admitted when `SHA-256(header_bytes(difficulty, nonce))`,
//! read as an unsigned 256-bit big-endian integer, is strictly below
//! `1 << (256 - difficulty_bits)`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::constants::{CANCEL_POLL_INTERVAL, HASH_BITS, HASH_SIZE, MAX_NONCE, POW_TARGET_DIFFICULTY};
use crate::{Block, ChainError, Hash};

/// Mining parameters threaded through every proof-of-work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowConfig {
    pub difficulty_bits: u32,
    /// Exclusive upper bound of the nonce search.
    pub max_nonce: u64,
}

impl PowConfig {
    pub fn new(difficulty_bits: u32) -> Result<Self, ChainError> {
        let config = Self {
            difficulty_bits,
            ..Self::default()
        };
        config.target()?;
        Ok(config)
    }

    pub fn with_max_nonce(mut self, max_nonce: u64) -> Self {
        self.max_nonce = max_nonce.min(MAX_NONCE);
        self
    }

    pub fn target(&self) -> Result<Target, ChainError> {
        Target::from_difficulty(self.difficulty_bits)
    }
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty_bits: POW_TARGET_DIFFICULTY,
            max_nonce: MAX_NONCE,
        }
    }
}

/// 256-bit threshold stored big-endian, so byte-wise ordering is numeric ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target([u8; HASH_SIZE]);

impl Target {
    /// `1 << (256 - difficulty_bits)`.
    pub fn from_difficulty(difficulty_bits: u32) -> Result<Self, ChainError> {
        if difficulty_bits == 0 || difficulty_bits > HASH_BITS {
            return Err(ChainError::InvalidDifficulty(difficulty_bits));
        }
        let shift = (HASH_BITS - difficulty_bits) as usize;
        let mut bytes = [0u8; HASH_SIZE];
        bytes[HASH_SIZE - 1 - shift / 8] = 1 << (shift % 8);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Strict `hash < target`.
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        *hash < self.0
    }
}

/// Cooperative cancellation for the nonce search: a shared stop flag, a
/// deadline, or both. The default never cancels.
#[derive(Clone, Debug, Default)]
pub struct MiningControl {
    stop: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl MiningControl {
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn should_stop(&self) -> bool {
        if let Some(stop) = &self.stop {
            if stop.load(Ordering::Relaxed) {
                return true;
            }
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }
}

/// A winning nonce and the digest it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub hash: Hash,
}

pub struct ProofOfWork<'a> {
    block: &'a Block,
    config: PowConfig,
    target: Target,
}

impl<'a> ProofOfWork<'a> {
    pub fn new(block: &'a Block, config: &PowConfig) -> Result<Self, ChainError> {
        Ok(Self {
            block,
            config: *config,
            target: config.target()?,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn prepare_data(&self, nonce: u64) -> Vec<u8> {
        self.block.header_bytes(self.config.difficulty_bits, nonce)
    }

    /// Search nonces from 0 upwards and return the first one whose digest is
    /// below the target.
    pub fn run(&self, control: &MiningControl) -> Result<Solution, ChainError> {
        debug!(
            difficulty = self.config.difficulty_bits,
            data_len = self.block.data.len(),
            "mining block"
        );
        let started = Instant::now();
        let mut nonce = 0u64;
        while nonce < self.config.max_nonce {
            if nonce % CANCEL_POLL_INTERVAL == 0 && control.should_stop() {
                debug!(nonce, "mining cancelled");
                return Err(ChainError::Cancelled { nonce });
            }
            let hash = self.block.compute_hash(self.config.difficulty_bits, nonce);
            if self.target.is_met_by(&hash) {
                info!(
                    nonce,
                    hash = %hex::encode(hash),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "mined block"
                );
                return Ok(Solution { nonce, hash });
            }
            nonce += 1;
        }
        Err(ChainError::ProofExhausted {
            max_nonce: self.config.max_nonce,
        })
    }

    /// Whether the block's stored nonce meets the target.
    pub fn validate(&self) -> bool {
        let hash = self.block.compute_hash(self.config.difficulty_bits, self.block.nonce);
        self.target.is_met_by(&hash)
    }

    /// `validate` plus a check that the stored hash is the recomputed digest.
    pub fn verify(&self) -> bool {
        let hash = self.block.compute_hash(self.config.difficulty_bits, self.block.nonce);
        self.target.is_met_by(&hash) && self.block.hash.as_slice() == hash.as_slice()
    }
}

/// Mine `block` and return it with `nonce` and `hash` filled in.
pub fn mine_block(mut block: Block, config: &PowConfig, control: &MiningControl) -> Result<Block, ChainError> {
    let solution = ProofOfWork::new(&block, config)?.run(control)?;
    block.nonce = solution.nonce;
    block.hash = solution.hash.to_vec();
    Ok(block)
}
