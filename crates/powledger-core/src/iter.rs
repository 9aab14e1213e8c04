use crate::{Block, ChainError, ChainStore};

/// Single-pass cursor walking blocks from a tip back to genesis.
///
/// Each step loads one block, so the chain is never held in memory. A
/// missing block is reported once as `NotFound` and ends the traversal.
pub struct ChainIterator<'a, S: ChainStore + ?Sized> {
    store: &'a S,
    current_hash: Vec<u8>,
}

impl<'a, S: ChainStore + ?Sized> ChainIterator<'a, S> {
    pub fn new(store: &'a S, tip: Vec<u8>) -> Self {
        Self {
            store,
            current_hash: tip,
        }
    }

    pub fn current_hash(&self) -> &[u8] {
        &self.current_hash
    }
}

impl<S: ChainStore + ?Sized> Iterator for ChainIterator<'_, S> {
    type Item = Result<Block, ChainError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_hash.is_empty() {
            return None;
        }
        let hash = std::mem::take(&mut self.current_hash);
        match self.store.get_block(&hash) {
            Ok(Some(block)) => {
                self.current_hash = block.previous_hash.clone();
                Some(Ok(block))
            }
            Ok(None) => Some(Err(ChainError::not_found(&hash))),
            Err(e) => Some(Err(e)),
        }
    }
}

impl<S: ChainStore + ?Sized> std::iter::FusedIterator for ChainIterator<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        blocks: Mutex<HashMap<Vec<u8>, Block>>,
        tip: Mutex<Option<Vec<u8>>>,
    }

    impl ChainStore for MapStore {
        fn tip(&self) -> Result<Option<Vec<u8>>, ChainError> {
            Ok(self.tip.lock().unwrap().clone())
        }

        fn get_block(&self, hash: &[u8]) -> Result<Option<Block>, ChainError> {
            Ok(self.blocks.lock().unwrap().get(hash).cloned())
        }

        fn commit(&self, block: &Block) -> Result<(), ChainError> {
            self.blocks
                .lock()
                .unwrap()
                .insert(block.hash.clone(), block.clone());
            *self.tip.lock().unwrap() = Some(block.hash.clone());
            Ok(())
        }

        fn flush(&self) -> Result<(), ChainError> {
            Ok(())
        }
    }

    fn link(store: &MapStore, hash: u8, previous: Option<u8>) {
        let block = Block {
            timestamp: hash as i64,
            previous_hash: previous.map(|p| vec![p; 32]).unwrap_or_default(),
            hash: vec![hash; 32],
            data: vec![hash],
            nonce: 0,
        };
        store.commit(&block).unwrap();
    }

    #[test]
    fn walks_tip_to_genesis() {
        let store = MapStore::default();
        link(&store, 1, None);
        link(&store, 2, Some(1));
        link(&store, 3, Some(2));

        let tip = store.tip().unwrap().unwrap();
        let data: Vec<u8> = ChainIterator::new(&store, tip)
            .map(|b| b.unwrap().data[0])
            .collect();
        assert_eq!(data, vec![3, 2, 1]);
    }

    #[test]
    fn empty_cursor_yields_nothing() {
        let store = MapStore::default();
        assert!(ChainIterator::new(&store, Vec::new()).next().is_none());
    }

    #[test]
    fn broken_link_is_reported_once() {
        let store = MapStore::default();
        link(&store, 2, Some(1));
        let mut iter = ChainIterator::new(&store, vec![2; 32]);
        assert_eq!(iter.next().unwrap().unwrap().data, vec![2]);
        assert_eq!(
            iter.next().unwrap().unwrap_err(),
            ChainError::not_found(&[1; 32])
        );
        assert!(iter.next().is_none());
    }

    #[test]
    fn cursor_follows_previous_hash() {
        let store = MapStore::default();
        link(&store, 1, None);
        link(&store, 2, Some(1));
        let mut iter = ChainIterator::new(&store, vec![2; 32]);
        assert_eq!(iter.current_hash(), &[2u8; 32]);
        iter.next();
        assert_eq!(iter.current_hash(), &[1u8; 32]);
        iter.next();
        assert!(iter.current_hash().is_empty());
    }
}
