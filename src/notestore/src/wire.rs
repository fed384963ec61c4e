//! Tag/wire-type field walker.
//!
//! Yields one [`Field`] per encoded field without interpreting field numbers.
//! A walker stops after the first error; there is no resynchronization.

use serde::Serialize;

use crate::varint::{read_fixed32, read_fixed64, read_varint};
use crate::{DecodeError, ErrorKind, Result};

/// Payload shape encoded in the low 3 bits of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::LengthDelimited => 2,
            Self::Fixed32 => 5,
        }
    }
}

/// Decoded field value, borrowing length-delimited payloads from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

impl Value<'_> {
    /// Numeric value of any scalar wire type
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Varint(v) | Self::Fixed64(v) => Some(v),
            Self::Fixed32(v) => Some(u64::from(v)),
            Self::Bytes(_) => None,
        }
    }
}

/// One decoded field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub number: u64,
    pub wire_type: WireType,
    pub value: Value<'a>,
    /// Absolute offset of the tag
    pub offset: usize,
    /// Absolute offset of the value (past the length prefix for payloads)
    pub data_offset: usize,
    /// Full encoding, tag included
    pub raw: &'a [u8],
}

impl<'a> Field<'a> {
    pub fn is(&self, number: u64, wire_type: WireType) -> bool {
        self.number == number && self.wire_type == wire_type
    }

    pub fn bytes(&self) -> Option<&'a [u8]> {
        match self.value {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Payload as UTF-8, failing with [`ErrorKind::InvalidUtf8`]
    pub fn text(&self) -> Result<&'a str> {
        let bytes = self
            .bytes()
            .ok_or_else(|| DecodeError::new(ErrorKind::InvalidUtf8, self.data_offset))?;

        std::str::from_utf8(bytes).map_err(|e| {
            DecodeError::new(ErrorKind::InvalidUtf8, self.data_offset + e.valid_up_to())
        })
    }

    /// Walker over this field's payload, if it has one
    pub fn nested(&self) -> Option<Walker<'a>> {
        self.bytes()
            .map(|bytes| Walker::with_base(bytes, self.data_offset))
    }
}

/// Cursor over the fields of one message
#[derive(Debug, Clone)]
pub struct Walker<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
    failed: bool,
}

/// Walk the fields of `buf` from offset 0
pub fn walk(buf: &[u8]) -> Walker<'_> {
    Walker::new(buf)
}

/// True when `buf` is non-empty and walks cleanly into fields numbered above 0
pub fn is_message(buf: &[u8]) -> bool {
    !buf.is_empty() && walk(buf).all(|field| field.is_ok_and(|f| f.number != 0))
}

impl<'a> Walker<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_base(buf, 0)
    }

    /// Walk `buf`, reporting offsets as if it started at `base`
    pub fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self {
            buf,
            pos: 0,
            base,
            failed: false,
        }
    }

    /// Absolute position of the cursor
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    fn read_field(&mut self) -> Result<Field<'a>> {
        let (field, end) = self
            .decode_at(self.pos)
            .map_err(|e| e.shifted(self.base))?;
        self.pos = end;
        Ok(field)
    }

    /// Decode the field starting at `start`, returning it and the position after it
    fn decode_at(&self, start: usize) -> Result<(Field<'a>, usize)> {
        let buf = self.buf;
        let (tag, n) = read_varint(buf, start)?;
        let mut pos = start + n;

        let bits = (tag & 0x7) as u8;
        let wire_type = WireType::from_bits(bits)
            .ok_or_else(|| DecodeError::new(ErrorKind::UnknownWireType(bits), start))?;

        let data_start;
        let value = match wire_type {
            WireType::Varint => {
                data_start = pos;
                let (v, n) = read_varint(buf, pos)?;
                pos += n;
                Value::Varint(v)
            }
            WireType::Fixed64 => {
                data_start = pos;
                let v = read_fixed64(buf, pos)?;
                pos += 8;
                Value::Fixed64(v)
            }
            WireType::Fixed32 => {
                data_start = pos;
                let v = read_fixed32(buf, pos)?;
                pos += 4;
                Value::Fixed32(v)
            }
            WireType::LengthDelimited => {
                let (len, n) = read_varint(buf, pos)?;
                data_start = pos + n;
                let available = buf.len() - data_start;
                let len = usize::try_from(len)
                    .ok()
                    .filter(|&len| len <= available)
                    .ok_or_else(|| {
                        DecodeError::new(
                            ErrorKind::TruncatedPayload {
                                needed: usize::try_from(len).unwrap_or(usize::MAX),
                                actual: available,
                            },
                            data_start,
                        )
                    })?;
                pos = data_start + len;
                Value::Bytes(&buf[data_start..pos])
            }
        };

        let field = Field {
            number: tag >> 3,
            wire_type,
            value,
            offset: self.base + start,
            data_offset: self.base + data_start,
            raw: &buf[start..pos],
        };
        Ok((field, pos))
    }
}

impl<'a> Iterator for Walker<'a> {
    type Item = Result<Field<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }

        let result = self.read_field();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for Walker<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Message;

    #[test]
    fn test_wire_type_bits() {
        for bits in [0u8, 1, 2, 5] {
            assert_eq!(WireType::from_bits(bits).map(WireType::bits), Some(bits));
        }
        for bits in [3u8, 4, 6, 7] {
            assert_eq!(WireType::from_bits(bits), None);
        }
    }

    #[test]
    fn test_walk_all_wire_types() {
        let buf = Message::new()
            .varint(1, 150)
            .fixed64(2, 0x0102_0304_0506_0708)
            .text(3, "hi")
            .fixed32(4, 7)
            .build();

        let fields: Vec<_> = walk(&buf).collect::<Result<_>>().unwrap();
        assert_eq!(fields.len(), 4);

        assert!(fields[0].is(1, WireType::Varint));
        assert_eq!(fields[0].value, Value::Varint(150));
        assert_eq!(fields[0].raw, &[0x08, 0x96, 0x01]);

        assert_eq!(fields[1].value, Value::Fixed64(0x0102_0304_0506_0708));
        assert_eq!(fields[2].text().unwrap(), "hi");
        assert_eq!(fields[3].value.as_u64(), Some(7));
        assert_eq!(fields[3].offset, buf.len() - 5);
    }

    #[test]
    fn test_is_message() {
        assert!(is_message(&Message::new().varint(1, 3).varint(2, 1).build()));
        assert!(!is_message(&[]));
        // field number 0
        assert!(!is_message(&[0x00, 0x01, 0x02]));
        // truncated varint
        assert!(!is_message(&[0x08, 0x80]));
    }

    #[test]
    fn test_walk_empty() {
        assert_eq!(walk(&[]).count(), 0);
    }

    #[test]
    fn test_walk_is_restartable() {
        let buf = Message::new().varint(1, 1).varint(2, 2).build();
        let first: Vec<_> = walk(&buf).map(|f| f.unwrap().number).collect();
        let second: Vec<_> = walk(&buf).map(|f| f.unwrap().number).collect();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_wire_type_stops_walk() {
        // field 1 varint, then tag 0x0b = field 1 wire type 3
        let buf = [0x08, 0x01, 0x0b, 0x08, 0x02];
        let mut walker = walk(&buf);

        assert!(walker.next().unwrap().is_ok());
        let err = walker.next().unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownWireType(3));
        assert_eq!(err.offset, 2);
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_payload_longer_than_buffer() {
        let buf = [0x12, 0x05, b'a', b'b'];
        let err = walk(&buf).next().unwrap().unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::TruncatedPayload {
                needed: 5,
                actual: 2
            }
        );
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_nested_offsets_are_absolute() {
        let inner = Message::new().varint(1, 1).text(2, "x");
        let buf = Message::new().varint(9, 0).message(5, inner).build();

        let outer: Vec<_> = walk(&buf).collect::<Result<_>>().unwrap();
        let container = outer[1];
        assert_eq!(container.data_offset, 4);

        let nested: Vec<_> = container.nested().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(nested[0].offset, 4);
        assert_eq!(nested[1].offset, 6);
        assert_eq!(nested[1].data_offset, 8);
    }

    #[test]
    fn test_nested_error_offset_is_absolute() {
        let buf = Message::new().message(1, Message::new().raw(&[0x80])).build();
        let field = walk(&buf).next().unwrap().unwrap();
        let err = field.nested().unwrap().next().unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteVarint);
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_invalid_utf8_text() {
        let buf = Message::new().bytes(2, &[b'o', b'k', 0xff]).build();
        let field = walk(&buf).next().unwrap().unwrap();
        let err = field.text().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidUtf8);
        assert_eq!(err.offset, 4);
    }
}
