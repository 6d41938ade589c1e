use cid::Cid;
use log::debug;

use crate::address::{DAG_CBOR_CODEC, compute_cid};
use crate::async_store::{AsyncStore, fetch};
use crate::chunk::{Manifest, Unit, chunk, reassemble};
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::graph::{ContainerId, NodeGraph};
use crate::guard;
use crate::node::Node;
use crate::tag;

/// Human-readable name of the content kind this codec handles.
pub const CODEC_NAME: &str = "dag-cbor";

/// Link-aware DAG-CBOR codec with transparent splitting of large documents.
///
/// The store is only read when a split document has to be reassembled or a
/// link has to be followed; nothing decoded is cached between calls.
pub struct Codec<S> {
    store: S,
    config: CodecConfig,
}

impl<S: AsyncStore> Codec<S> {
    /// Creates a codec with the default size limits.
    pub fn new(store: S) -> Self {
        Codec {
            store,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(store: S, config: CodecConfig) -> Result<Self, CodecError> {
        config.validate()?;
        Ok(Codec { store, config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Multicodec code of the blocks this codec decodes.
    pub fn multicodec(&self) -> u64 {
        DAG_CBOR_CODEC
    }

    /// Encodes a node into one buffer without splitting it.
    pub fn encode(&self, node: &Node) -> Result<Vec<u8>, CodecError> {
        tag::encode(node)
    }

    /// Decodes one block without reassembling split documents.
    pub fn decode(&self, bytes: &[u8]) -> Result<Node, CodecError> {
        tag::decode(bytes, self.config.hard_size_limit)
    }

    /// Encodes a node into units ready to be stored.
    ///
    /// The last unit is always the root. When the document was split, the
    /// raw chunks come first and must be stored before the root.
    pub fn serialize(&self, node: &Node) -> Result<Vec<Unit>, CodecError> {
        let buffer = self.encode(node)?;
        chunk(
            &buffer,
            self.config.block_size_limit,
            self.config.hard_size_limit,
            self.config.hash,
        )
    }

    /// Serializes a native graph, refusing it if it contains a cycle.
    pub fn serialize_graph(&self, graph: &NodeGraph, root: ContainerId) -> Result<Vec<Unit>, CodecError> {
        guard::check(graph, root)?;
        let node = graph.to_node(root)?;
        self.serialize(&node)
    }

    /// Decodes a block, reassembling it first if it is a manifest.
    pub async fn deserialize(&self, bytes: &[u8]) -> Result<Node, CodecError> {
        let root = self.decode(bytes)?;
        match Manifest::from_node(&root)? {
            Some(manifest) => {
                let buffer = reassemble(&manifest, &self.store).await?;
                self.decode(&buffer)
            }
            None => Ok(root),
        }
    }

    /// Addresses referenced by a block: its own first, then any chunks.
    pub fn addresses(&self, bytes: &[u8]) -> Result<Vec<Cid>, CodecError> {
        let mut cids = vec![compute_cid(DAG_CBOR_CODEC, bytes, self.config.hash)];
        if let Some(manifest) = Manifest::from_node(&self.decode(bytes)?)? {
            cids.extend_from_slice(manifest.chunks());
        }
        Ok(cids)
    }

    /// Writes units to the store in the given order, skipping ones already present.
    ///
    /// Returns how many units were written.
    pub async fn store_units(&self, units: &[Unit]) -> Result<usize, CodecError> {
        let cids: Vec<Cid> = units.iter().map(|u| *u.cid()).collect();
        let present = self
            .store
            .async_has_many(&cids)
            .await
            .map_err(|e| CodecError::Store(e.to_string()))?;

        let missing: Vec<(&Cid, &[u8])> = units
            .iter()
            .zip(present)
            .filter(|(_, has)| !has)
            .map(|(u, _)| (u.cid(), u.data()))
            .collect();
        self.store
            .async_put_many(&missing)
            .await
            .map_err(|e| CodecError::Store(e.to_string()))?;

        debug!("stored {} of {} units", missing.len(), units.len());
        Ok(missing.len())
    }

    /// Serializes and stores a node, returning the root address.
    pub async fn put(&self, node: &Node) -> Result<Cid, CodecError> {
        let units = self.serialize(node)?;
        self.store_units(&units).await?;
        units
            .last()
            .map(|u| *u.cid())
            .ok_or_else(|| CodecError::InvalidNode("serialization produced no units".into()))
    }

    /// Fetches and deserializes the document stored at `cid`.
    pub async fn get(&self, cid: &Cid) -> Result<Node, CodecError> {
        let bytes = fetch(&self.store, cid).await?;
        self.deserialize(&bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, Store};
    use crate::address::RAW_CODEC;
    use serde_json::json;

    fn small_codec(store: &MemoryStore) -> Codec<&MemoryStore> {
        let config = CodecConfig::default()
            .with_block_size_limit(16)
            .with_hard_size_limit(4096);
        Codec::with_config(store, config).unwrap()
    }

    fn document() -> Node {
        Node::try_from(json!({
            "title": "a document long enough to be split",
            "tags": ["x", "y", "z"],
            "count": 3
        }))
        .unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = CodecConfig::default().with_block_size_limit(0);
        assert!(Codec::with_config(MemoryStore::new(), config).is_err());
    }

    #[test]
    fn multicodec_is_dag_cbor() {
        let codec = Codec::new(MemoryStore::new());
        assert_eq!(codec.multicodec(), 0x71);
        assert_eq!(CODEC_NAME, "dag-cbor");
    }

    #[test]
    fn small_node_is_one_unit() {
        let codec = Codec::new(MemoryStore::new());
        let units = codec.serialize(&document()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].data(), codec.encode(&document()).unwrap().as_slice());
    }

    #[test]
    fn oversize_node_is_rejected() {
        let store = MemoryStore::new();
        let config = CodecConfig::default()
            .with_block_size_limit(8)
            .with_hard_size_limit(16);
        let codec = Codec::with_config(&store, config).unwrap();

        let err = codec.serialize(&document()).unwrap_err();
        assert!(matches!(err, CodecError::Oversize { limit: 16, .. }));
    }

    #[tokio::test]
    async fn split_node_roundtrip() {
        let store = MemoryStore::new();
        let codec = small_codec(&store);

        let units = codec.serialize(&document()).unwrap();
        assert!(units.len() > 2);
        codec.store_units(&units).await.unwrap();

        let root = units.last().unwrap().data();
        assert_eq!(codec.deserialize(root).await.unwrap(), document());
    }

    #[tokio::test]
    async fn split_node_without_chunks_fails() {
        let store = MemoryStore::new();
        let codec = small_codec(&store);

        let units = codec.serialize(&document()).unwrap();
        let root = units.last().unwrap().data();
        let err = codec.deserialize(root).await.unwrap_err();
        assert!(matches!(err, CodecError::MissingLink(c) if c == *units[0].cid()));
    }

    #[test]
    fn addresses_of_plain_and_split_nodes() {
        let store = MemoryStore::new();
        let plain = Codec::new(&store);
        let bytes = plain.encode(&document()).unwrap();
        let cids = plain.addresses(&bytes).unwrap();
        assert_eq!(cids, vec![*plain.serialize(&document()).unwrap()[0].cid()]);

        let codec = small_codec(&store);
        let units = codec.serialize(&document()).unwrap();
        let (root, chunks) = units.split_last().unwrap();
        let cids = codec.addresses(root.data()).unwrap();
        assert_eq!(cids[0], *root.cid());
        assert_eq!(cids.len(), units.len());
        assert!(cids[1..].iter().zip(chunks).all(|(a, u)| a == u.cid()));
        assert!(cids[1..].iter().all(|c| c.codec() == RAW_CODEC));
    }

    #[tokio::test]
    async fn store_units_skips_present_blocks() {
        let store = MemoryStore::new();
        let codec = small_codec(&store);
        let units = codec.serialize(&document()).unwrap();

        assert_eq!(codec.store_units(&units).await.unwrap(), units.len());
        assert_eq!(codec.store_units(&units).await.unwrap(), 0);
        assert_eq!(store.len(), units.len());
    }

    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryStore,
        writes: std::sync::Mutex<Vec<Cid>>,
    }

    impl Store for RecordingStore {
        type Error = std::convert::Infallible;

        fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Self::Error> {
            self.inner.get(cid)
        }

        fn put(&self, cid: &Cid, block: &[u8]) -> Result<(), Self::Error> {
            self.writes.lock().unwrap().push(*cid);
            self.inner.put(cid, block)
        }

        fn has(&self, cid: &Cid) -> Result<bool, Self::Error> {
            self.inner.has(cid)
        }
    }

    #[tokio::test]
    async fn manifest_is_written_after_its_chunks() {
        let store = RecordingStore::default();
        let config = CodecConfig::default()
            .with_block_size_limit(16)
            .with_hard_size_limit(4096);
        let codec = Codec::with_config(&store, config).unwrap();

        let root = codec.put(&document()).await.unwrap();
        let writes = store.writes.lock().unwrap().clone();
        assert_eq!(writes.last(), Some(&root));
        assert!(writes[..writes.len() - 1].iter().all(|c| c.codec() == RAW_CODEC));
    }

    #[test]
    fn too_deep_node_is_rejected_before_chunking() {
        let codec = Codec::new(MemoryStore::new());
        let deep = (0..=tag::MAX_NESTING_DEPTH).fold(Node::Null, |inner, _| Node::List(vec![inner]));

        assert!(matches!(codec.serialize(&deep), Err(CodecError::InvalidNode(_))));
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = MemoryStore::new();
        let codec = small_codec(&store);

        let cid = codec.put(&document()).await.unwrap();
        assert_eq!(cid.codec(), DAG_CBOR_CODEC);
        assert_eq!(codec.get(&cid).await.unwrap(), document());
    }

    #[test]
    fn serialize_graph_rejects_cycles() {
        let codec = Codec::new(MemoryStore::new());
        let mut graph = NodeGraph::new();
        let root = graph.add_map();
        let child = graph.add_list();
        graph.insert(root, "child", child).unwrap();
        graph.push(child, root).unwrap();

        let err = codec.serialize_graph(&graph, root).unwrap_err();
        assert!(matches!(err, CodecError::CircularReference));
    }

    #[test]
    fn serialize_graph_encodes_acyclic_graphs() {
        let codec = Codec::new(MemoryStore::new());
        let mut graph = NodeGraph::new();
        let root = graph.add_map();
        graph.insert(root, "title", Node::from("graph")).unwrap();

        let units = codec.serialize_graph(&graph, root).unwrap();
        let expected = codec
            .serialize(&Node::map([("title", Node::from("graph"))]).unwrap())
            .unwrap();
        assert_eq!(units, expected);
    }
}
