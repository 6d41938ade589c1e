use cid::Cid;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::RwLock;

/// Block storage the codec writes units into and follows links through.
///
/// A block is the exact byte string a [`Unit`](crate::Unit) carries: a whole
/// DAG-CBOR document, a manifest, or one raw chunk of a split document. The
/// store never looks inside; it is keyed by the block's CID.
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the block stored under `cid`, if any.
    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Writes a block. Writing the same CID twice is harmless.
    fn put(&self, cid: &Cid, block: &[u8]) -> Result<(), Self::Error>;

    fn has(&self, cid: &Cid) -> Result<bool, Self::Error>;
}

impl<S: Store> Store for &S {
    type Error = S::Error;

    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Self::Error> {
        (*self).get(cid)
    }

    fn put(&self, cid: &Cid, block: &[u8]) -> Result<(), Self::Error> {
        (*self).put(cid, block)
    }

    fn has(&self, cid: &Cid) -> Result<bool, Self::Error> {
        (*self).has(cid)
    }
}

/// Blocks held in process memory.
///
/// Enough for a codec that only needs to round-trip split documents within
/// one process, and the store every test in this crate runs against.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops a block, returning it if it was present.
    ///
    /// Removing one chunk of a split document leaves its manifest unreadable.
    pub fn remove(&self, cid: &Cid) -> Option<Vec<u8>> {
        self.blocks.write().unwrap().remove(cid)
    }
}

impl Store for MemoryStore {
    type Error = Infallible;

    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.blocks.read().unwrap().get(cid).cloned())
    }

    fn put(&self, cid: &Cid, block: &[u8]) -> Result<(), Self::Error> {
        self.blocks
            .write()
            .unwrap()
            .entry(*cid)
            .or_insert_with(|| block.to_vec());
        Ok(())
    }

    fn has(&self, cid: &Cid) -> Result<bool, Self::Error> {
        Ok(self.blocks.read().unwrap().contains_key(cid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{HashAlgorithm, RAW_CODEC, compute_cid};

    fn raw_cid(data: &[u8]) -> Cid {
        compute_cid(RAW_CODEC, data, HashAlgorithm::Sha2_256)
    }

    #[test]
    fn memory_store_put_get() {
        let store = MemoryStore::new();
        let cid = raw_cid(b"hello world");

        store.put(&cid, b"hello world").unwrap();

        assert_eq!(store.get(&cid).unwrap(), Some(b"hello world".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_store_get_missing() {
        let store = MemoryStore::new();
        let cid = raw_cid(b"nonexistent");

        assert_eq!(store.get(&cid).unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_has() {
        let store = MemoryStore::new();
        let cid = raw_cid(b"value");

        assert!(!store.has(&cid).unwrap());

        store.put(&cid, b"value").unwrap();

        assert!(store.has(&cid).unwrap());
    }

    #[test]
    fn memory_store_remove() {
        let store = MemoryStore::new();
        let cid = raw_cid(b"chunk");
        store.put(&cid, b"chunk").unwrap();

        assert_eq!(store.remove(&cid), Some(b"chunk".to_vec()));
        assert_eq!(store.remove(&cid), None);
        assert!(!store.has(&cid).unwrap());
    }

    #[test]
    fn rewriting_a_block_keeps_one_copy() {
        let store = MemoryStore::new();
        let cid = raw_cid(b"same");
        store.put(&cid, b"same").unwrap();
        store.put(&cid, b"same").unwrap();

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_by_reference() {
        let store = MemoryStore::new();
        let cid = raw_cid(b"shared");
        let by_ref = &store;

        by_ref.put(&cid, b"shared").unwrap();

        assert!(store.has(&cid).unwrap());
    }
}
