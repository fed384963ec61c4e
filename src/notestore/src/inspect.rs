//! Schema-less field dump for reverse engineering note bodies.
//!
//! Length-delimited payloads are resolved by [`probe`]: shown as text when
//! they are readable UTF-8, parsed as a nested message when the whole payload
//! walks cleanly, and kept as bytes otherwise.

use std::fmt::Write;

use serde::{Serialize, Serializer};

use crate::lines::FORMAT_MARKER;
use crate::wire::{is_message, Field, Value, Walker, WireType};
use crate::{decompress, Result};

/// Nesting depth past which payloads are no longer probed as messages
pub const MAX_DEPTH: usize = 32;

/// Resolved shape of a length-delimited payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Message(Vec<Node>),
    Text(String),
    Bytes(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
}

/// One field in the dump tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub field: u64,
    pub wire_type: WireType,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalar: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// Hex of the full field encoding
    pub raw: String,
}

impl Node {
    fn from_field(field: &Field<'_>, depth: usize) -> Self {
        let (scalar, payload) = match field.value {
            Value::Bytes(bytes) => (None, Some(probe(bytes, field.data_offset, depth))),
            other => (other.as_u64(), None),
        };

        Self {
            field: field.number,
            wire_type: field.wire_type,
            offset: field.offset,
            scalar,
            payload,
            raw: hex::encode(field.raw),
        }
    }
}

/// Dump every field of a note body (inflating it first if needed)
pub fn inspect(data: &[u8]) -> Result<Vec<Node>> {
    let buf = decompress::inflate(data)?;
    walk_nodes(&buf, 0, 0)
}

/// Resolve a payload found at absolute offset `base`.
///
/// Readable text wins over a message parse: short ASCII runs often walk
/// cleanly as fields.
pub fn probe(bytes: &[u8], base: usize, depth: usize) -> Payload {
    if let Ok(text) = std::str::from_utf8(bytes) {
        if is_readable(text) {
            return Payload::Text(text.to_owned());
        }
    }

    if depth < MAX_DEPTH {
        if let Some(nodes) = try_message(bytes, base, depth) {
            return Payload::Message(nodes);
        }
    }

    Payload::Bytes(bytes.to_vec())
}

fn try_message(bytes: &[u8], base: usize, depth: usize) -> Option<Vec<Node>> {
    if !is_message(bytes) {
        return None;
    }
    walk_nodes(bytes, base, depth + 1).ok()
}

fn walk_nodes(buf: &[u8], base: usize, depth: usize) -> Result<Vec<Node>> {
    Walker::with_base(buf, base)
        .map(|field| field.map(|f| Node::from_field(&f, depth)))
        .collect()
}

fn is_readable(text: &str) -> bool {
    !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | FORMAT_MARKER))
}

/// Indented text rendering of a dump tree
pub fn render_tree(nodes: &[Node]) -> std::result::Result<String, std::fmt::Error> {
    let mut out = String::new();
    render_into(&mut out, nodes, 0)?;
    Ok(out)
}

fn render_into(out: &mut String, nodes: &[Node], indent: usize) -> std::fmt::Result {
    let pad = "  ".repeat(indent);

    for node in nodes {
        write!(out, "{pad}#{} {:?} @{}", node.field, node.wire_type, node.offset)?;

        match (&node.scalar, &node.payload) {
            (Some(value), _) => writeln!(out, " = {value}")?,
            (None, Some(Payload::Message(children))) => {
                writeln!(out, " {{")?;
                render_into(out, children, indent + 1)?;
                writeln!(out, "{pad}}}")?;
            }
            (None, Some(Payload::Text(text))) => writeln!(out, " = {text:?}")?,
            (None, Some(Payload::Bytes(bytes))) => writeln!(out, " = <{}>", hex::encode(bytes))?,
            (None, None) => writeln!(out)?,
        }
    }

    Ok(())
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{self, Message};
    use crate::ErrorKind;

    #[test]
    fn test_probe_message() {
        let bytes = Message::new().varint(1, 5).text(2, "hi").build();
        let Payload::Message(nodes) = probe(&bytes, 0, 0) else {
            panic!("expected message");
        };
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].scalar, Some(5));
        assert_eq!(nodes[1].payload, Some(Payload::Text("hi".to_string())));
    }

    #[test]
    fn test_probe_text() {
        assert_eq!(probe(b"hello", 0, 0), Payload::Text("hello".to_string()));
        // walks cleanly as field 13 = 105, still shown as text
        assert_eq!(probe(b"hi", 0, 0), Payload::Text("hi".to_string()));
        assert_eq!(
            probe("caf\u{e9}\n".as_bytes(), 0, 0),
            Payload::Text("caf\u{e9}\n".to_string())
        );
        assert_eq!(probe(b"", 0, 0), Payload::Text(String::new()));
    }

    #[test]
    fn test_probe_bytes() {
        assert_eq!(probe(&[0xff, 0xfe], 0, 0), Payload::Bytes(vec![0xff, 0xfe]));
        // Walks cleanly but field 0 is never valid
        assert_eq!(probe(&[0x00, 0x07], 0, 0), Payload::Bytes(vec![0x00, 0x07]));
    }

    #[test]
    fn test_probe_depth_limit() {
        let bytes = Message::new().varint(1, 1).build();
        assert!(matches!(probe(&bytes, 0, MAX_DEPTH), Payload::Text(_) | Payload::Bytes(_)));
    }

    #[test]
    fn test_inspect_gzip_note() {
        let blob = fixture::gzip(&fixture::note(vec![Message::new().text(2, "note text")]));
        let nodes = inspect(&blob).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].raw, "0800");
        let Some(Payload::Message(container)) = &nodes[1].payload else {
            panic!("expected container message");
        };
        let Some(Payload::Message(block)) = &container[0].payload else {
            panic!("expected block message");
        };
        assert_eq!(block[0].payload, Some(Payload::Text("note text".to_string())));
    }

    #[test]
    fn test_inspect_reports_errors() {
        let err = inspect(&[0x08]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteVarint);
    }

    #[test]
    fn test_render_tree() {
        let bytes = Message::new()
            .varint(1, 5)
            .message(2, Message::new().bytes(3, &[0xff]))
            .build();
        let nodes = inspect(&bytes).unwrap();

        let rendered = render_tree(&nodes).unwrap();
        assert_eq!(
            rendered,
            "#1 Varint @0 = 5\n#2 LengthDelimited @2 {\n  #3 LengthDelimited @4 = <ff>\n}\n"
        );
    }

    #[test]
    fn test_json_shape() {
        let bytes = Message::new().bytes(3, &[0xff]).build();
        let json = serde_json::to_value(inspect(&bytes).unwrap()).unwrap();
        assert_eq!(json[0]["field"], 3);
        assert_eq!(json[0]["wire_type"], "length_delimited");
        assert_eq!(json[0]["payload"]["kind"], "bytes");
        assert_eq!(json[0]["payload"]["value"], "ff");
        assert!(json[0].get("scalar").is_none());
    }
}
