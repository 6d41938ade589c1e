use cid::Cid;

use crate::graph::GraphError;

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("the object passed has circular references")]
    CircularReference,
    #[error("node is too large: {size} bytes exceeds the {limit} byte limit")]
    Oversize { size: usize, limit: usize },
    #[error("cannot find link \"{segment}\"")]
    NotFound { segment: String },
    #[error("missing link: {0}")]
    MissingLink(Cid),
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] cid::Error),
    #[error("invalid node: {0}")]
    InvalidNode(String),
    #[error("malformed block: {0}")]
    Malformed(String),
    #[error("encode error: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),
    #[error("decode error: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("store error: {0}")]
    Store(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CodecError {
    /// HTTP-style status for errors that have one (404 for a missing path segment).
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CodecError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
