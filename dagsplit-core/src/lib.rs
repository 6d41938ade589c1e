//! Dagsplit is a link-aware DAG-CBOR codec for content-addressed documents.
//!
//! Core concepts:
//! - **Node**: A document value; links to other blocks are a distinct variant
//! - **Unit**: An immutable block, its CID plus its bytes
//! - **Manifest**: The root of a document too large for one block, listing its raw chunks
//! - **Codec**: Serializes nodes into units, deserializes (and reassembles) them,
//!   resolves paths across linked documents and lists a document's keys
//!
//! # Example
//!
//! ```
//! use dagsplit_core::{Codec, MemoryStore, Node};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let codec = Codec::new(MemoryStore::new());
//!
//! let leaf = codec.put(&Node::map([("b", Node::from(42i64))]).unwrap()).await.unwrap();
//! let root = Node::map([("a", Node::link(leaf))]).unwrap();
//!
//! let bytes = codec.encode(&root).unwrap();
//! let resolved = codec.resolve(&bytes, "a/b").await.unwrap();
//! assert_eq!(resolved.value, Node::from(42i64));
//! # });
//! # }
//! ```
//!
//! # Serialization
//!
//! Links are written as CBOR tag 42 around a `0x00`-prefixed binary CID and
//! map keys are emitted in canonical DAG-CBOR order, so the same node always
//! encodes to the same bytes and the same address. Encoded documents larger
//! than the block size limit are split into raw chunks plus a manifest.

mod address;
mod async_store;
mod chunk;
mod codec;
mod config;
mod error;
mod graph;
pub mod guard;
mod node;
mod resolve;
mod store;
pub mod tag;
mod tree;

pub use address::{
    DAG_CBOR_CODEC, HashAlgorithm, RAW_CODEC, compute_cid, is_node_address, parse_address,
};
pub use async_store::AsyncStore;
pub use chunk::{
    CHUNKS_KEY, LEGACY_MANIFEST_KEY, MANIFEST_KEY, MANIFEST_KIND, Manifest, Unit, chunk, reassemble,
};
pub use cid::Cid;
pub use codec::{CODEC_NAME, Codec};
pub use config::{CodecConfig, DEFAULT_BLOCK_SIZE_LIMIT, DEFAULT_HARD_SIZE_LIMIT};
pub use error::CodecError;
pub use graph::{Container, ContainerId, GraphError, NodeGraph, Slot};
pub use node::{LINK_KEY, Node};
pub use resolve::{DagPath, Resolution};
pub use store::{MemoryStore, Store};
