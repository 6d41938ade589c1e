use cid::Cid;
use log::warn;
use std::future::Future;

use crate::Store;
use crate::error::CodecError;

/// Block storage as the codec actually drives it.
///
/// Every store read the codec makes goes through this trait: chunk fetches
/// during reassembly run concurrently, and link hops during resolution wait
/// on one block at a time. A remote or on-disk store implements it directly;
/// any [`Store`] gets it for free.
pub trait AsyncStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn async_get(&self, cid: &Cid) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;
    fn async_put(&self, cid: &Cid, block: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;
    fn async_has(&self, cid: &Cid) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Writes blocks one after another in slice order.
    ///
    /// Units of a split document arrive chunks first and manifest last, so a
    /// reader never sees a manifest whose chunks are not yet written.
    fn async_put_many(
        &self,
        blocks: &[(&Cid, &[u8])],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let blocks: Vec<(Cid, Vec<u8>)> = blocks.iter().map(|(cid, block)| (**cid, block.to_vec())).collect();
        async move {
            for (cid, block) in &blocks {
                self.async_put(cid, block).await?;
            }
            Ok(())
        }
    }

    /// Presence of each CID, in input order.
    fn async_has_many(
        &self,
        cids: &[Cid],
    ) -> impl Future<Output = Result<Vec<bool>, Self::Error>> + Send {
        let cids = cids.to_vec();
        async move {
            let mut present = Vec::with_capacity(cids.len());
            for cid in &cids {
                present.push(self.async_has(cid).await?);
            }
            Ok(present)
        }
    }
}

impl<S: Store + Send + Sync> AsyncStore for S {
    type Error = S::Error;

    async fn async_get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Self::Error> {
        self.get(cid)
    }

    async fn async_put(&self, cid: &Cid, block: &[u8]) -> Result<(), Self::Error> {
        self.put(cid, block)
    }

    async fn async_has(&self, cid: &Cid) -> Result<bool, Self::Error> {
        self.has(cid)
    }
}

/// Fetches a block that must exist.
///
/// Both an absent block and a store failure surface as
/// [`CodecError::MissingLink`]; the store error is logged.
pub(crate) async fn fetch<S: AsyncStore>(store: &S, cid: &Cid) -> Result<Vec<u8>, CodecError> {
    match store.async_get(cid).await {
        Ok(Some(bytes)) => Ok(bytes),
        Ok(None) => Err(CodecError::MissingLink(*cid)),
        Err(e) => {
            warn!("fetching {cid} failed: {e}");
            Err(CodecError::MissingLink(*cid))
        }
    }
}
