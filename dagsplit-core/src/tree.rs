use log::debug;

use crate::async_store::{AsyncStore, fetch};
use crate::chunk::Manifest;
use crate::codec::Codec;
use crate::error::CodecError;

impl<S: AsyncStore> Codec<S> {
    /// Lists the immediate keys of the document encoded in `bytes`.
    ///
    /// For a split document this does not reassemble: each chunk is fetched
    /// and decoded on its own, and its keys are listed in chunk order. Chunks
    /// that are not self-contained CBOR values fail to decode.
    pub async fn tree(&self, bytes: &[u8]) -> Result<Vec<String>, CodecError> {
        let root = self.decode(bytes)?;
        let Some(manifest) = Manifest::from_node(&root)? else {
            return Ok(root.keys());
        };

        debug!("listing keys of {} chunks", manifest.chunks().len());
        let mut keys = Vec::new();
        for cid in manifest.chunks() {
            let block = fetch(self.store(), cid).await?;
            keys.extend(self.decode(&block)?.keys());
        }
        Ok(keys)
    }
}
