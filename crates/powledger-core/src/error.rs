//! Error type shared by the chain, the proof-of-work engine and store backends.

use thiserror::Error;

/// Errors surfaced by chain operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The underlying medium could not be opened, created or reconciled.
    #[error("storage init error: {0}")]
    StorageInit(String),

    /// An append transaction failed to commit. The tip was not moved.
    #[error("storage write error: {0}")]
    StorageWrite(String),

    /// A read from the underlying medium failed.
    #[error("storage read error: {0}")]
    StorageRead(String),

    /// No block is stored under the requested hash.
    #[error("block not found: {0}")]
    NotFound(String),

    /// The nonce search reached `max_nonce` without meeting the target.
    #[error("proof of work exhausted after {max_nonce} nonces")]
    ProofExhausted { max_nonce: u64 },

    /// The nonce search was stopped by its caller.
    #[error("mining cancelled at nonce {nonce}")]
    Cancelled { nonce: u64 },

    /// Stored bytes could not be decoded into a block.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Difficulty outside `1..=256` bits.
    #[error("invalid difficulty: {0} bits (expected 1..=256)")]
    InvalidDifficulty(u32),

    /// A stored block failed linkage, digest or proof checks.
    #[error("invalid block {hash}: {reason}")]
    InvalidBlock { hash: String, reason: String },
}

impl ChainError {
    pub fn not_found(hash: &[u8]) -> Self {
        ChainError::NotFound(hex::encode(hash))
    }

    pub fn invalid_block(hash: &[u8], reason: impl Into<String>) -> Self {
        ChainError::InvalidBlock {
            hash: hex::encode(hash),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_hex() {
        let err = ChainError::not_found(&[0xab, 0x01]);
        assert_eq!(err.to_string(), "block not found: ab01");
    }

    #[test]
    fn exhausted_message() {
        let err = ChainError::ProofExhausted { max_nonce: 10 };
        assert_eq!(err.to_string(), "proof of work exhausted after 10 nonces");
    }
}
