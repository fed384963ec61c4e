//! Best-effort classification of the scalar fields left over in content blocks.
//!
//! Nothing here affects rendered text. Values are bucketed by range alone,
//! independent of field number:
//!
//! | Wire type          | Bucket                                             |
//! |--------------------|----------------------------------------------------|
//! | varint / fixed32   | timestamp if inside the window, flag if a sentinel, identifier otherwise |
//! | fixed64            | cross-reference (last one per block wins)          |
//! | length-delimited   | opaque format data (last one per block wins)       |
//!
//! Format data that opens with a known header is scanned further for inline
//! style markers by [`FormatData::parse`].

use serde::{Deserialize, Serialize, Serializer};

use crate::wire::{Field, Value};

/// Start of the default timestamp window, 2024-01-01T00:00:00Z
pub const DEFAULT_WINDOW_START: u64 = 1_704_067_200;

/// End of the default timestamp window, 2027-01-01T00:00:00Z
pub const DEFAULT_WINDOW_END: u64 = 1_798_761_600;

/// Sentinel observed on paragraph state fields
pub const DEFAULT_STATE_FLAG: u64 = 1;

/// Sentinel observed on paragraph type fields
pub const DEFAULT_TYPE_FLAG: u64 = 67;

/// Headers that open a format-data payload
pub const FORMAT_HEADERS: [&[u8]; 2] = [&[0x18, 0x01, 0x4a, 0x10], &[0x14, 0x18, 0x01, 0x4a, 0x10]];

/// Wildcard inside a marker, skipped between markers
pub const ESCAPE_BYTE: u8 = 0xfd;

/// Style markers seen inside format data
const FORMAT_MARKERS: [[u8; 3]; 3] = [[0x2e, 0x41, 0x40], [0x0f, 0x3c, 0x4f], [0x3f, 0x73, 0x4b]];

/// Value ranges used to classify leftover scalars.
///
/// The defaults were calibrated against one capture session and are unlikely
/// to hold for notes written long before or after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Inclusive range of Unix seconds treated as timestamps
    pub timestamp_window: (u64, u64),
    pub state_flag: u64,
    pub type_flag: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            timestamp_window: (DEFAULT_WINDOW_START, DEFAULT_WINDOW_END),
            state_flag: DEFAULT_STATE_FLAG,
            type_flag: DEFAULT_TYPE_FLAG,
        }
    }
}

/// Bucket for a single scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Timestamp,
    Flag,
    Identifier,
}

impl MetadataConfig {
    pub fn classify(&self, value: u64) -> Scalar {
        let (start, end) = self.timestamp_window;
        if (start..=end).contains(&value) {
            Scalar::Timestamp
        } else if value == self.state_flag || value == self.type_flag {
            Scalar::Flag
        } else {
            Scalar::Identifier
        }
    }
}

/// Scalars gathered from one content block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMetadata {
    pub identifiers: Vec<u64>,
    pub flags: Vec<u64>,
    pub timestamps: Vec<u64>,
    pub reference: Option<u64>,
    pub format_data: Option<Vec<u8>>,
}

impl BlockMetadata {
    /// Record a field the content extractor did not claim
    pub fn absorb(&mut self, field: &Field<'_>, config: &MetadataConfig) {
        match field.value {
            Value::Varint(v) => self.push_scalar(v, config),
            Value::Fixed32(v) => self.push_scalar(u64::from(v), config),
            Value::Fixed64(v) => self.reference = Some(v),
            Value::Bytes(bytes) => self.format_data = Some(bytes.to_vec()),
        }
    }

    fn push_scalar(&mut self, value: u64, config: &MetadataConfig) {
        match config.classify(value) {
            Scalar::Timestamp => self.timestamps.push(value),
            Scalar::Flag => self.flags.push(value),
            Scalar::Identifier => self.identifiers.push(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
            && self.flags.is_empty()
            && self.timestamps.is_empty()
            && self.reference.is_none()
            && self.format_data.is_none()
    }
}

/// Note-level view of all block metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSummary {
    pub format_version: Option<u64>,
    pub created: Option<u64>,
    pub modified: Option<u64>,
    pub other_timestamps: Vec<u64>,
    pub type_flags: Vec<u64>,
    pub state_flags: Vec<u64>,
    pub references: Vec<u64>,
    pub identifiers: Vec<u64>,
    #[serde(serialize_with = "serialize_hex_list")]
    pub format_data: Vec<Vec<u8>>,
    /// Entries of `format_data` that carry a known header, parsed
    pub formats: Vec<FormatData>,
}

impl MetadataSummary {
    /// Aggregate blocks in document order
    pub fn from_blocks(blocks: &[BlockMetadata], config: &MetadataConfig) -> Self {
        let mut summary = Self::default();
        let mut timestamps = Vec::new();

        for block in blocks {
            summary.identifiers.extend_from_slice(&block.identifiers);
            timestamps.extend_from_slice(&block.timestamps);

            for &flag in &block.flags {
                if flag == config.type_flag {
                    summary.type_flags.push(flag);
                } else {
                    summary.state_flags.push(flag);
                }
            }

            summary.references.extend(block.reference);
            summary.format_data.extend(block.format_data.iter().cloned());
            summary
                .formats
                .extend(block.format_data.as_deref().and_then(FormatData::parse));
        }

        summary.format_version = summary.identifiers.first().copied();

        let mut timestamps = timestamps.into_iter();
        summary.created = timestamps.next();
        summary.modified = timestamps.next();
        summary.other_timestamps = timestamps.collect();

        summary
    }
}

/// Style markers found in a format-data payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatData {
    #[serde(serialize_with = "serialize_hex")]
    pub header: Vec<u8>,
    pub markers: Vec<FormatMarker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatMarker {
    /// Leading byte of the marker
    pub kind: u8,
    /// Position within the payload
    pub offset: usize,
    #[serde(serialize_with = "serialize_hex")]
    pub raw: Vec<u8>,
}

impl FormatData {
    /// Scan `data` for markers; `None` unless it starts with a known header.
    ///
    /// Marker bytes after the first may be replaced by [`ESCAPE_BYTE`].
    /// Anything unrecognised is stepped over one byte at a time.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let header = FORMAT_HEADERS.iter().find(|h| data.starts_with(h))?;
        let mut markers = Vec::new();
        let mut pos = header.len();

        while pos < data.len() {
            let rest = &data[pos..];
            match FORMAT_MARKERS.iter().find(|m| matches_marker(rest, m)) {
                Some(marker) => {
                    markers.push(FormatMarker {
                        kind: rest[0],
                        offset: pos,
                        raw: rest[..marker.len()].to_vec(),
                    });
                    pos += marker.len();
                }
                None => pos += 1,
            }
        }

        Some(Self {
            header: header.to_vec(),
            markers,
        })
    }
}

fn matches_marker(data: &[u8], marker: &[u8; 3]) -> bool {
    data.len() >= marker.len()
        && data[0] == marker[0]
        && data[1..marker.len()]
            .iter()
            .zip(&marker[1..])
            .all(|(&b, &m)| b == m || b == ESCAPE_BYTE)
}

fn serialize_hex<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(data))
}

fn serialize_hex_list<S: Serializer>(data: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(data.iter().map(hex::encode))
}
