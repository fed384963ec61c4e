//! Test-only message builder.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::varint::write_varint;
use crate::wire::WireType;

#[derive(Debug, Clone, Default)]
pub(crate) struct Message {
    buf: Vec<u8>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    fn tag(&mut self, field: u64, wire_type: WireType) {
        write_varint(field << 3 | u64::from(wire_type.bits()), &mut self.buf);
    }

    pub fn varint(mut self, field: u64, value: u64) -> Self {
        self.tag(field, WireType::Varint);
        write_varint(value, &mut self.buf);
        self
    }

    pub fn fixed64(mut self, field: u64, value: u64) -> Self {
        self.tag(field, WireType::Fixed64);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn fixed32(mut self, field: u64, value: u32) -> Self {
        self.tag(field, WireType::Fixed32);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(mut self, field: u64, data: &[u8]) -> Self {
        self.tag(field, WireType::LengthDelimited);
        write_varint(data.len() as u64, &mut self.buf);
        self.buf.extend_from_slice(data);
        self
    }

    pub fn text(self, field: u64, text: &str) -> Self {
        self.bytes(field, text.as_bytes())
    }

    pub fn message(self, field: u64, message: Message) -> Self {
        self.bytes(field, &message.buf)
    }

    /// Append bytes verbatim, for malformed input
    pub fn raw(mut self, data: &[u8]) -> Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Wrap content blocks into a container inside an outer message
pub(crate) fn note(blocks: Vec<Message>) -> Vec<u8> {
    let container = blocks
        .into_iter()
        .fold(Message::new(), |container, block| container.message(3, block));

    Message::new()
        .varint(1, 0)
        .message(2, container)
        .build()
}

pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
