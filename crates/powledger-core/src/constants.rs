pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_BITS: u32 = (HASH_SIZE * BYTE) as u32;
pub const POW_TARGET_DIFFICULTY: u32 = 16;
pub const MAX_NONCE: u64 = i64::MAX as u64;
/// Nonces searched between two cancellation checks.
pub const CANCEL_POLL_INTERVAL: u64 = 1 << 10;
pub const GENESIS_DATA: &str = "Genesis Block";
