//! Splitting oversized documents into raw blocks and putting them back together.
//!
//! A split document is stored as its raw slices followed by a manifest node:
//!
//! ```text
//! { "_.": "dag-split", "chunks": [ {"/": <raw cid>}, ... ] }
//! ```

use cid::Cid;
use futures::future::try_join_all;
use log::debug;

use crate::address::{DAG_CBOR_CODEC, HashAlgorithm, RAW_CODEC, compute_cid};
use crate::async_store::{AsyncStore, fetch};
use crate::error::CodecError;
use crate::node::Node;
use crate::tag;

/// Key holding the manifest marker.
pub const MANIFEST_KEY: &str = "_.";

/// Marker key written by older encoders; still recognised when reading.
pub const LEGACY_MANIFEST_KEY: &str = "._";

/// Marker value identifying a manifest.
pub const MANIFEST_KIND: &str = "dag-split";

pub const CHUNKS_KEY: &str = "chunks";

/// An immutable content-addressed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    cid: Cid,
    data: Vec<u8>,
}

impl Unit {
    /// Addresses `data` as a block of the given content kind.
    pub fn new(codec: u64, data: Vec<u8>, hash: HashAlgorithm) -> Self {
        let cid = compute_cid(codec, &data, hash);
        Unit { cid, data }
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (Cid, Vec<u8>) {
        (self.cid, self.data)
    }

    /// True for raw slices of a split document.
    pub fn is_raw(&self) -> bool {
        self.cid.codec() == RAW_CODEC
    }
}

/// The ordered list of raw slices making up a split document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    chunks: Vec<Cid>,
}

impl Manifest {
    pub fn new(chunks: Vec<Cid>) -> Self {
        Manifest { chunks }
    }

    pub fn chunks(&self) -> &[Cid] {
        &self.chunks
    }

    pub fn to_node(&self) -> Node {
        Node::Map(
            [
                (MANIFEST_KEY.to_string(), Node::from(MANIFEST_KIND)),
                (
                    CHUNKS_KEY.to_string(),
                    Node::List(self.chunks.iter().copied().map(Node::Link).collect()),
                ),
            ]
            .into_iter()
            .collect(),
        )
    }

    /// Reads a manifest out of a decoded root node.
    ///
    /// Returns `Ok(None)` for ordinary nodes. A node carrying the marker but
    /// no well-formed chunk list is an error.
    pub fn from_node(node: &Node) -> Result<Option<Self>, CodecError> {
        let Node::Map(map) = node else {
            return Ok(None);
        };
        let marked = [MANIFEST_KEY, LEGACY_MANIFEST_KEY]
            .iter()
            .any(|key| matches!(map.get(*key), Some(Node::String(kind)) if kind == MANIFEST_KIND));
        if !marked {
            return Ok(None);
        }

        let Some(Node::List(links)) = map.get(CHUNKS_KEY) else {
            return Err(CodecError::Malformed(
                "manifest is missing its chunk list".into(),
            ));
        };
        let chunks = links
            .iter()
            .map(|link| {
                link.as_link().copied().ok_or_else(|| {
                    CodecError::Malformed(format!("manifest chunk is not a link: {link:?}"))
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Some(Manifest { chunks }))
    }
}

/// Turns an encoded document into storable units.
///
/// Documents within `block_size_limit` become a single node unit. Larger ones
/// become raw slices of at most `block_size_limit` bytes followed by the
/// manifest unit, which is never split itself. Anything over
/// `hard_size_limit` is rejected before a unit is produced.
pub fn chunk(
    buffer: &[u8],
    block_size_limit: usize,
    hard_size_limit: usize,
    hash: HashAlgorithm,
) -> Result<Vec<Unit>, CodecError> {
    if buffer.len() > hard_size_limit {
        return Err(CodecError::Oversize {
            size: buffer.len(),
            limit: hard_size_limit,
        });
    }
    if block_size_limit == 0 {
        return Err(CodecError::Config("block size limit must be positive".into()));
    }
    if buffer.len() <= block_size_limit {
        return Ok(vec![Unit::new(DAG_CBOR_CODEC, buffer.to_vec(), hash)]);
    }

    let mut units: Vec<Unit> = buffer
        .chunks(block_size_limit)
        .map(|slice| Unit::new(RAW_CODEC, slice.to_vec(), hash))
        .collect();
    let manifest = Manifest::new(units.iter().map(|u| u.cid).collect());
    debug!(
        "split {} bytes into {} chunks of at most {} bytes",
        buffer.len(),
        units.len(),
        block_size_limit
    );

    let manifest_bytes = tag::encode(&manifest.to_node())?;
    units.push(Unit::new(DAG_CBOR_CODEC, manifest_bytes, hash));
    Ok(units)
}

/// Fetches every chunk of a manifest and concatenates them in manifest order.
///
/// Fetches run concurrently. Any missing chunk fails the whole call.
pub async fn reassemble<S: AsyncStore>(manifest: &Manifest, store: &S) -> Result<Vec<u8>, CodecError> {
    let blocks = try_join_all(manifest.chunks().iter().map(|cid| fetch(store, cid))).await?;
    let buffer = blocks.concat();
    debug!(
        "reassembled {} bytes from {} chunks",
        buffer.len(),
        manifest.chunks().len()
    );
    Ok(buffer)
}
