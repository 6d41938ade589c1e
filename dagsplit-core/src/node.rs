use std::collections::BTreeMap;

use cid::Cid;
use indexmap::IndexMap;
use ipld_core::ipld::Ipld;

use crate::address::parse_address;
use crate::error::CodecError;

/// Key that marks a single-entry map as a link: `{"/": "<cid>"}`.
pub const LINK_KEY: &str = "/";

/// A value in the linked-data document model.
///
/// Links are a distinct variant rather than a map shape. Constructors that
/// accept maps ([`Node::map`], `TryFrom<serde_json::Value>`) turn the
/// `{"/": "<cid>"}` convention into a [`Node::Link`].
///
/// Map equality ignores insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Integer(i128),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Node>),
    Map(IndexMap<String, Node>),
    Link(Cid),
}

impl Node {
    /// Creates a link to the given address.
    pub fn link(cid: Cid) -> Self {
        Node::Link(cid)
    }

    /// Creates a link from an address string.
    pub fn parse_link(address: &str) -> Result<Self, CodecError> {
        Ok(Node::Link(parse_address(address)?))
    }

    /// Builds a map node, applying the link convention.
    ///
    /// A single `"/"` entry holding an address string yields a [`Node::Link`].
    pub fn map<K, I>(entries: I) -> Result<Self, CodecError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        let map: IndexMap<String, Node> = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        match link_sentinel(&map) {
            Some(cid) => Ok(Node::Link(cid?)),
            None => Ok(Node::Map(map)),
        }
    }

    /// Returns the link target, if this node is a link.
    pub fn as_link(&self) -> Option<&Cid> {
        match self {
            Node::Link(cid) => Some(cid),
            _ => None,
        }
    }

    /// Returns the child selected by one path segment.
    ///
    /// Maps are indexed by key, lists by decimal position.
    pub fn get(&self, segment: &str) -> Option<&Node> {
        match self {
            Node::Map(map) => map.get(segment),
            Node::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Consumes the node and returns the child selected by one path segment.
    pub fn take(self, segment: &str) -> Option<Node> {
        match self {
            Node::Map(mut map) => map.swap_remove(segment),
            Node::List(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.into_iter().nth(i)),
            _ => None,
        }
    }

    /// Immediate keys: map keys in document order, list indices, nothing for scalars.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Node::Map(map) => map.keys().cloned().collect(),
            Node::List(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Detects the `{"/": "<cid>"}` link shape.
///
/// Returns `None` for ordinary maps, including the empty map.
pub(crate) fn link_sentinel(map: &IndexMap<String, Node>) -> Option<Result<Cid, CodecError>> {
    if map.len() != 1 {
        return None;
    }
    let target = map.get(LINK_KEY)?;
    Some(match target {
        Node::String(address) => parse_address(address),
        Node::Link(cid) => Ok(*cid),
        other => Err(CodecError::InvalidNode(format!(
            "link target must be an address string, got {other:?}"
        ))),
    })
}

impl From<bool> for Node {
    fn from(v: bool) -> Self {
        Node::Bool(v)
    }
}

impl From<i64> for Node {
    fn from(v: i64) -> Self {
        Node::Integer(v.into())
    }
}

impl From<u64> for Node {
    fn from(v: u64) -> Self {
        Node::Integer(v.into())
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Float(v)
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Self {
        Node::String(v.to_string())
    }
}

impl From<String> for Node {
    fn from(v: String) -> Self {
        Node::String(v)
    }
}

impl From<Vec<Node>> for Node {
    fn from(v: Vec<Node>) -> Self {
        Node::List(v)
    }
}

impl From<Cid> for Node {
    fn from(cid: Cid) -> Self {
        Node::Link(cid)
    }
}

impl TryFrom<serde_json::Value> for Node {
    type Error = CodecError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as Json;

        Ok(match value {
            Json::Null => Node::Null,
            Json::Bool(b) => Node::Bool(b),
            Json::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Node::Integer(u.into())
                } else if let Some(i) = n.as_i64() {
                    Node::Integer(i.into())
                } else {
                    Node::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Node::String(s),
            Json::Array(items) => Node::List(
                items
                    .into_iter()
                    .map(Node::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(fields) => {
                let entries = fields
                    .into_iter()
                    .map(|(k, v)| Ok((k, Node::try_from(v)?)))
                    .collect::<Result<Vec<_>, CodecError>>()?;
                Node::map(entries)?
            }
        })
    }
}

impl From<Ipld> for Node {
    fn from(ipld: Ipld) -> Self {
        match ipld {
            Ipld::Null => Node::Null,
            Ipld::Bool(b) => Node::Bool(b),
            Ipld::Integer(i) => Node::Integer(i),
            Ipld::Float(f) => Node::Float(f),
            Ipld::String(s) => Node::String(s),
            Ipld::Bytes(b) => Node::Bytes(b),
            Ipld::List(items) => Node::List(items.into_iter().map(Node::from).collect()),
            Ipld::Map(map) => Node::Map(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect()),
            Ipld::Link(cid) => Node::Link(cid),
        }
    }
}

impl From<Node> for Ipld {
    fn from(node: Node) -> Self {
        match node {
            Node::Null => Ipld::Null,
            Node::Bool(b) => Ipld::Bool(b),
            Node::Integer(i) => Ipld::Integer(i),
            Node::Float(f) => Ipld::Float(f),
            Node::String(s) => Ipld::String(s),
            Node::Bytes(b) => Ipld::Bytes(b),
            Node::List(items) => Ipld::List(items.into_iter().map(Ipld::from).collect()),
            Node::Map(map) => Ipld::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Ipld::from(v)))
                    .collect::<BTreeMap<_, _>>(),
            ),
            Node::Link(cid) => Ipld::Link(cid),
        }
    }
}
