//! Proof-of-work admission engine and hash-linked chain.
//!
//! Blocks are framed into bytes, mined against a difficulty target and
//! handed to a [`ChainStore`] backend that keeps them keyed by hash
//! alongside a tip pointer. [`Chain`] drives appends; [`ChainIterator`]
//! walks the result from tip to genesis.

pub mod block;
pub mod chain;
pub mod constants;
pub mod error;
pub mod iter;
pub mod pow;

pub use block::Block;
pub use chain::{Chain, ChainStore};
pub use error::ChainError;
pub use iter::ChainIterator;
pub use pow::{MiningControl, PowConfig, ProofOfWork, Solution, Target};

pub type Hash = [u8; constants::HASH_SIZE];
