//! Path resolution across linked documents.

use std::collections::VecDeque;
use std::fmt;

use cid::Cid;
use log::{debug, trace};

use crate::address::is_node_address;
use crate::async_store::{AsyncStore, fetch};
use crate::codec::Codec;
use crate::error::CodecError;
use crate::node::Node;

/// A sequence of segments selecting children of a node.
///
/// Built from a `/`-delimited string, empty segments are dropped, so
/// `"/a//b/"` and `"a/b"` are the same path. Built from a list, segments are
/// taken as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DagPath {
    segments: VecDeque<String>,
}

impl DagPath {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    fn next_segment(&mut self) -> Option<String> {
        self.segments.pop_front()
    }
}

impl fmt::Display for DagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.segments().collect();
        f.write_str(&joined.join("/"))
    }
}

impl From<&str> for DagPath {
    fn from(path: &str) -> Self {
        DagPath {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<String> for DagPath {
    fn from(path: String) -> Self {
        DagPath::from(path.as_str())
    }
}

impl From<Vec<String>> for DagPath {
    fn from(segments: Vec<String>) -> Self {
        DagPath {
            segments: segments.into(),
        }
    }
}

impl From<&[&str]> for DagPath {
    fn from(segments: &[&str]) -> Self {
        DagPath {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Outcome of resolving a path.
///
/// When resolution stopped at a link to content this codec does not decode,
/// `value` is that [`Node::Link`] and `remaining_path` holds the unconsumed
/// segments joined with `/`. Otherwise `remaining_path` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: Node,
    pub remaining_path: String,
}

enum Step {
    Value(Node),
    Link(Cid),
}

/// Walks `path` inside one document until it is exhausted or a link is hit.
fn walk(mut current: Node, path: &mut DagPath) -> Result<Step, CodecError> {
    while let Some(segment) = path.next_segment() {
        trace!("resolving segment {segment:?}");
        current = match current.take(&segment) {
            Some(child) => child,
            None => return Err(CodecError::NotFound { segment }),
        };
        if let Node::Link(cid) = current {
            return Ok(Step::Link(cid));
        }
    }
    Ok(Step::Value(current))
}

impl<S: AsyncStore> Codec<S> {
    /// Resolves `path` starting at the document encoded in `bytes`.
    ///
    /// Links to DAG-CBOR documents are fetched and resolution continues at the
    /// root of the fetched document with the segments still left. A link to
    /// any other content kind ends resolution.
    pub async fn resolve(&self, bytes: &[u8], path: impl Into<DagPath>) -> Result<Resolution, CodecError> {
        let mut path = path.into();
        let mut root = self.deserialize(bytes).await?;

        loop {
            match walk(root, &mut path)? {
                Step::Value(value) => {
                    return Ok(Resolution {
                        value,
                        remaining_path: path.to_string(),
                    });
                }
                Step::Link(cid) if !is_node_address(&cid) => {
                    debug!("stopping at foreign link {cid} with {path:?} left");
                    return Ok(Resolution {
                        value: Node::Link(cid),
                        remaining_path: path.to_string(),
                    });
                }
                Step::Link(cid) => {
                    debug!("following link {cid}");
                    let linked = fetch(self.store(), &cid).await?;
                    root = self.deserialize(&linked).await?;
                }
            }
        }
    }
}
