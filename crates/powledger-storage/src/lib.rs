pub mod codec;
pub mod memory_store;
pub mod sled_store;

use std::path::Path;
use std::sync::Arc;

use powledger_core::{Chain, ChainError, PowConfig};

pub use codec::{decode_block, encode_block};
pub use memory_store::MemoryStore;
pub use sled_store::SledStore;

/// Reserved key holding the current tip hash. Block keys are always 32 bytes.
pub const KEY_TIP: &[u8] = b"l";

/// Open the sled database at `path` and load its chain, creating the genesis
/// block on first use.
pub fn open_or_create<P: AsRef<Path>>(
    path: P,
    config: PowConfig,
) -> Result<Chain<SledStore>, ChainError> {
    let store = SledStore::open(path)?;
    Chain::open_or_create(Arc::new(store), config)
}
