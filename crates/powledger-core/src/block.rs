use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::GENESIS_DATA;
use crate::Hash;

/// One admitted record of the chain.
///
/// `hash` is the proof-of-work digest of the other fields and doubles as the
/// block's storage key. The genesis block has an empty `previous_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub timestamp: i64,
    pub previous_hash: Vec<u8>,
    pub hash: Vec<u8>,
    pub data: Vec<u8>,
    pub nonce: u64,
}

impl Block {
    /// Unsolved candidate referencing `previous_hash`, stamped with the current time.
    pub fn new(data: impl Into<Vec<u8>>, previous_hash: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp: now_secs(),
            previous_hash: previous_hash.into(),
            hash: Vec::new(),
            data: data.into(),
            nonce: 0,
        }
    }

    pub fn genesis() -> Self {
        Self::new(GENESIS_DATA, Vec::new())
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_empty()
    }

    /// Bytes fed to SHA-256 for a given difficulty and nonce:
    /// `previous_hash || data || timestamp || difficulty_bits || nonce`,
    /// integers as 8-byte big-endian, no delimiters.
    pub fn header_bytes(&self, difficulty_bits: u32, nonce: u64) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.previous_hash.len() + self.data.len() + 8 * 3);
        bytes.extend_from_slice(&self.previous_hash);
        bytes.extend_from_slice(&self.data);
        bytes.extend_from_slice(&self.timestamp.to_be_bytes());
        bytes.extend_from_slice(&i64::from(difficulty_bits).to_be_bytes());
        bytes.extend_from_slice(&nonce.to_be_bytes());
        bytes
    }

    pub fn compute_hash(&self, difficulty_bits: u32, nonce: u64) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.header_bytes(difficulty_bits, nonce));
        hasher.finalize().into()
    }
}

/// Seconds since the Unix epoch, negative for a clock set before it.
fn now_secs() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
