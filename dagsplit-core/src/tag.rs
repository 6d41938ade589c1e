//! Link tagging and the CBOR layer underneath it.
//!
//! Links travel as CBOR tag 42 wrapping a byte string: a `0x00` multibase
//! prefix followed by the binary CID. Map keys are written in DAG-CBOR
//! canonical order (shorter first, then bytewise) so equal nodes encode to
//! identical bytes.

use ciborium::Value;
use ciborium::value::Integer;
use cid::Cid;

use crate::error::CodecError;
use crate::node::{Node, link_sentinel};

/// CBOR tag identifying a content address.
pub const CID_CBOR_TAG: u64 = 42;

/// Prefix byte in front of the binary CID inside the tag.
const CID_PREFIX: u8 = 0x00;

/// Deepest nesting of lists, maps and links a block may carry.
///
/// Encoding refuses anything deeper and decoding reads up to exactly this
/// depth, so every block this crate writes can be read back.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Rewrites a node into its CBOR form, wrapping every link in tag 42.
///
/// A raw map holding only a `"/"` address string is treated as a link too.
/// Nodes nested deeper than [`MAX_NESTING_DEPTH`] are rejected.
pub fn tag(node: &Node) -> Result<Value, CodecError> {
    tag_at(node, 0)
}

fn tag_at(node: &Node, depth: usize) -> Result<Value, CodecError> {
    if depth == MAX_NESTING_DEPTH && matches!(node, Node::List(_) | Node::Map(_) | Node::Link(_)) {
        return Err(CodecError::InvalidNode(format!(
            "node is nested deeper than {MAX_NESTING_DEPTH} levels"
        )));
    }
    Ok(match node {
        Node::Null => Value::Null,
        Node::Bool(b) => Value::Bool(*b),
        Node::Integer(i) => Value::Integer(Integer::try_from(*i).map_err(|_| {
            CodecError::InvalidNode(format!("integer {i} is outside the CBOR range"))
        })?),
        Node::Float(f) => Value::Float(*f),
        Node::String(s) => Value::Text(s.clone()),
        Node::Bytes(b) => Value::Bytes(b.clone()),
        Node::List(items) => Value::Array(
            items
                .iter()
                .map(|item| tag_at(item, depth + 1))
                .collect::<Result<_, _>>()?,
        ),
        Node::Link(cid) => tag_cid(cid),
        Node::Map(map) => {
            if let Some(cid) = link_sentinel(map) {
                return Ok(tag_cid(&cid?));
            }
            let mut entries: Vec<(&String, &Node)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
            Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((Value::Text(k.clone()), tag_at(v, depth + 1)?)))
                    .collect::<Result<_, CodecError>>()?,
            )
        }
    })
}

fn tag_cid(cid: &Cid) -> Value {
    let mut bytes = vec![CID_PREFIX];
    bytes.extend_from_slice(&cid.to_bytes());
    Value::Tag(CID_CBOR_TAG, Box::new(Value::Bytes(bytes)))
}

/// Turns a decoded CBOR value back into a node, resolving tag 42 into links.
pub fn untag(value: Value) -> Result<Node, CodecError> {
    Ok(match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(b),
        Value::Integer(i) => Node::Integer(i.into()),
        Value::Float(f) => Node::Float(f),
        Value::Text(s) => Node::String(s),
        Value::Bytes(b) => Node::Bytes(b),
        Value::Array(items) => Node::List(items.into_iter().map(untag).collect::<Result<_, _>>()?),
        Value::Map(entries) => Node::Map(
            entries
                .into_iter()
                .map(|(k, v)| match k {
                    Value::Text(key) => Ok((key, untag(v)?)),
                    other => Err(CodecError::Malformed(format!(
                        "map keys must be strings, got {other:?}"
                    ))),
                })
                .collect::<Result<_, _>>()?,
        ),
        Value::Tag(CID_CBOR_TAG, inner) => Node::Link(untag_cid(*inner)?),
        Value::Tag(other, _) => {
            return Err(CodecError::Malformed(format!("unsupported CBOR tag {other}")));
        }
        other => {
            return Err(CodecError::Malformed(format!("unsupported CBOR value {other:?}")));
        }
    })
}

fn untag_cid(inner: Value) -> Result<Cid, CodecError> {
    match inner {
        Value::Bytes(bytes) if !bytes.is_empty() => Ok(Cid::try_from(&bytes[1..])?),
        other => Err(CodecError::Malformed(format!(
            "tag {CID_CBOR_TAG} must wrap a prefixed CID byte string, got {other:?}"
        ))),
    }
}

/// Tags and encodes a node into a single CBOR buffer.
///
/// Floats are written at the shortest width that holds them exactly, not
/// always as 64-bit, so float-carrying blocks are not canonical DAG-CBOR.
pub fn encode(node: &Node) -> Result<Vec<u8>, CodecError> {
    let value = tag(node)?;
    let mut buffer = Vec::new();
    ciborium::into_writer(&value, &mut buffer)?;
    Ok(buffer)
}

/// Decodes the first CBOR item in `bytes`, refusing buffers over `max_size`.
pub fn decode(bytes: &[u8], max_size: usize) -> Result<Node, CodecError> {
    if bytes.len() > max_size {
        return Err(CodecError::Oversize {
            size: bytes.len(),
            limit: max_size,
        });
    }
    let value: Value = ciborium::de::from_reader_with_recursion_limit(bytes, MAX_NESTING_DEPTH)?;
    untag(value)
}
