//! Stored form of a block.
//!
//! bincode with fixed-width integers: `timestamp` as 8 bytes, then
//! `previous_hash`, `hash` and `data` each as a u64 length followed by the
//! bytes, then `nonce` as 8 bytes. Trailing bytes are rejected.

use bincode::Options;
use powledger_core::{Block, ChainError};

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub fn encode_block(block: &Block) -> Result<Vec<u8>, ChainError> {
    options()
        .serialize(block)
        .map_err(|e| ChainError::Serialization(e.to_string()))
}

pub fn decode_block(bytes: &[u8]) -> Result<Block, ChainError> {
    options()
        .deserialize(bytes)
        .map_err(|e| ChainError::Serialization(e.to_string()))
}
