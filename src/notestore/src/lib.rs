//! # notestore
//!
//! Decoder for the note body blobs kept in the desktop Notes database.
//!
//! Note bodies are stored gzip-compressed in a protobuf-like encoding with no
//! public schema. The layout handled here was reverse engineered from samples,
//! so unknown fields are tolerated and some values are classified by range.
//!
//! # Format Overview
//!
//! ```text
//! outer message
//! └── field 2 (bytes)         content container
//!     └── field 3 (bytes)     content block, repeated
//!         ├── field 2 (bytes) text
//!         ├── field 4 (int)   checklist state
//!         ├── field 5 (int)   nesting level
//!         └── ...             metadata scalars
//! ```
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let blob = std::fs::read("note.bin")?;
//!
//! for item in notestore::decode(&blob)? {
//!     let mark = match (item.is_checklist_item, item.is_checked) {
//!         (true, true) => "[x] ",
//!         (true, false) => "[ ] ",
//!         _ => "",
//!     };
//!     println!("{}{}{}", "  ".repeat(item.level as usize), mark, item.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod content;
pub mod decompress;
pub mod inspect;
pub mod lines;
pub mod metadata;
pub mod varint;
pub mod wire;

#[cfg(test)]
pub(crate) mod fixture;

#[doc(inline)]
pub use content::{extract, extract_partial, Extraction};
#[doc(inline)]
pub use decompress::{inflate, is_gzip, GZIP_MAGIC};
#[doc(inline)]
pub use inspect::{inspect, probe, render_tree, Node, Payload};
#[doc(inline)]
pub use lines::{reconstruct, NoteItem, Reconstruction};
#[doc(inline)]
pub use metadata::{BlockMetadata, FormatData, FormatMarker, MetadataConfig, MetadataSummary};
#[doc(inline)]
pub use wire::{walk, Field, Value, Walker, WireType};

use tracing::warn;

/// What went wrong while decoding
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("incomplete varint")]
    IncompleteVarint,

    #[error("varint longer than 10 bytes")]
    VarintTooLong,

    #[error("truncated fixed-width value: need {needed} bytes, got {actual}")]
    TruncatedFixed { needed: usize, actual: usize },

    #[error("truncated length-delimited payload: need {needed} bytes, got {actual}")]
    TruncatedPayload { needed: usize, actual: usize },

    #[error("unknown wire type {0}")]
    UnknownWireType(u8),

    #[error("gzip inflation failed: {0}")]
    InflationFailure(String),

    #[error("invalid UTF-8 in text field")]
    InvalidUtf8,

    #[error("array length mismatch: {checklist} unused checklist states, {levels} unused nesting levels")]
    ArrayMismatch { checklist: usize, levels: usize },
}

/// Structural decode failure with the byte offset where it happened.
///
/// Offsets are absolute within the inflated buffer, including for fields
/// found inside nested blocks.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at byte {offset}")]
pub struct DecodeError {
    pub kind: ErrorKind,
    pub offset: usize,
}

impl DecodeError {
    pub fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// Move a buffer-relative offset into the coordinates of an enclosing buffer
    pub(crate) fn shifted(mut self, base: usize) -> Self {
        self.offset += base;
        self
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Per-call decoding options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fail with [`ErrorKind::ArrayMismatch`] when checklist states or nesting
    /// levels are left over after all lines are consumed. When false the
    /// mismatch is only logged.
    pub strict: bool,
    pub metadata: MetadataConfig,
}

/// Whatever could be decoded, plus the error that stopped decoding (if any)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partial {
    pub items: Vec<NoteItem>,
    pub error: Option<DecodeError>,
}

impl Partial {
    pub fn into_result(self) -> Result<Vec<NoteItem>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.items),
        }
    }
}

/// Decode a note body into its lines.
///
/// An empty vector means the blob has no content container; render a
/// fallback (such as the stored snippet) in that case.
pub fn decode(data: &[u8]) -> Result<Vec<NoteItem>> {
    decode_with(data, &DecodeOptions::default())
}

/// [`decode`] with explicit options
pub fn decode_with(data: &[u8], options: &DecodeOptions) -> Result<Vec<NoteItem>> {
    decode_partial(data, options).into_result()
}

/// Decode as far as possible.
///
/// On a structural error the items reconstructed from the text gathered
/// before the error are returned alongside it.
pub fn decode_partial(data: &[u8], options: &DecodeOptions) -> Partial {
    let buf = match decompress::inflate(data) {
        Ok(buf) => buf,
        Err(err) => {
            return Partial {
                items: Vec::new(),
                error: Some(err),
            }
        }
    };

    let (extraction, error) = content::extract_partial(&buf, &options.metadata);
    let reconstruction = extraction.reconstruct();
    let error = error.or_else(|| check_alignment(&reconstruction, buf.len(), options.strict));

    Partial {
        items: reconstruction.items,
        error,
    }
}

fn check_alignment(
    reconstruction: &Reconstruction,
    end: usize,
    strict: bool,
) -> Option<DecodeError> {
    if reconstruction.is_aligned() {
        return None;
    }

    let kind = ErrorKind::ArrayMismatch {
        checklist: reconstruction.unused_states,
        levels: reconstruction.unused_levels,
    };
    if strict {
        return Some(DecodeError::new(kind, end));
    }

    warn!(%kind, "checklist/nesting arrays do not line up with text");
    None
}

/// Summarize the leftover scalar fields of a note body
pub fn analyze_metadata(data: &[u8]) -> Result<MetadataSummary> {
    analyze_metadata_with(data, &MetadataConfig::default())
}

/// [`analyze_metadata`] with an explicit classification config
pub fn analyze_metadata_with(data: &[u8], config: &MetadataConfig) -> Result<MetadataSummary> {
    let buf = decompress::inflate(data)?;
    let extraction = content::extract(&buf, config)?;
    Ok(MetadataSummary::from_blocks(&extraction.blocks, config))
}
