use cid::Cid;
use multihash_codetable::{Code, MultihashDigest};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// DAG-CBOR codec code (0x71). Blocks of this kind decode to a [`Node`](crate::Node).
pub const DAG_CBOR_CODEC: u64 = 0x71;

/// Raw codec code (0x55). Used for the slices of a split document.
pub const RAW_CODEC: u64 = 0x55;

/// Hash function used when computing content addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "sha2-256")]
    Sha2_256,
    #[serde(rename = "blake3-256")]
    Blake3_256,
}

impl HashAlgorithm {
    fn code(self) -> Code {
        match self {
            HashAlgorithm::Sha2_256 => Code::Sha2_256,
            HashAlgorithm::Blake3_256 => Code::Blake3_256,
        }
    }
}

/// Computes the CIDv1 of `data` for the given content kind.
pub fn compute_cid(codec: u64, data: &[u8], hash: HashAlgorithm) -> Cid {
    let digest = hash.code().digest(data);
    Cid::new_v1(codec, digest)
}

/// Parses a content-address string (any multibase CID encoding).
pub fn parse_address(address: &str) -> Result<Cid, CodecError> {
    Ok(Cid::try_from(address)?)
}

/// Returns true if the address points at a block this codec decodes.
pub fn is_node_address(cid: &Cid) -> bool {
    cid.codec() == DAG_CBOR_CODEC
}
