//! Content extraction: finds the note text, checklist states and nesting
//! levels inside an (already inflated) note body.
//!
//! Two levels of nesting are walked. The first outer field 2 is the content
//! container; every container field 3 is a content block whose fields carry
//! text (2), checklist state (4) and nesting level (5). Anything else inside a
//! block goes to that block's [`BlockMetadata`].

use tracing::{debug, warn};

use crate::lines::{self, Reconstruction, LINE_SEPARATOR};
use crate::metadata::{BlockMetadata, MetadataConfig};
use crate::varint::read_packed;
use crate::wire::{is_message, walk, Field, Value, WireType};
use crate::{DecodeError, Result};

/// Outer field holding the content container
pub const CONTAINER_FIELD: u64 = 2;

/// Container field holding one content block
pub const BLOCK_FIELD: u64 = 3;

/// Block field: UTF-8 text
pub const TEXT_FIELD: u64 = 2;

/// Block field: checklist state, non-zero when checked
pub const CHECKLIST_FIELD: u64 = 4;

/// Block field: nesting level
pub const LEVEL_FIELD: u64 = 5;

/// Everything pulled out of one note body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Accumulated text, `None` when no text field was found
    pub content: Option<String>,
    pub checklist_states: Vec<bool>,
    pub nesting_levels: Vec<u64>,
    pub blocks: Vec<BlockMetadata>,
}

impl Extraction {
    pub fn reconstruct(&self) -> Reconstruction {
        match &self.content {
            Some(text) => lines::reconstruct(text, &self.checklist_states, &self.nesting_levels),
            None => Reconstruction::default(),
        }
    }

    fn push_text(&mut self, field: &Field<'_>) {
        let text = match field.text() {
            Ok(text) => text.to_owned(),
            Err(err) => {
                warn!(%err, "lossy decoding of note text");
                String::from_utf8_lossy(field.bytes().unwrap_or_default()).into_owned()
            }
        };

        match &mut self.content {
            Some(content) => {
                content.push(LINE_SEPARATOR);
                content.push_str(&text);
            }
            None => self.content = Some(text),
        }
    }
}

/// Extract content, failing on the first structural error
pub fn extract(buf: &[u8], config: &MetadataConfig) -> Result<Extraction> {
    match extract_partial(buf, config) {
        (extraction, None) => Ok(extraction),
        (_, Some(err)) => Err(err),
    }
}

/// Extract content, keeping whatever was gathered before a structural error
pub fn extract_partial(
    buf: &[u8],
    config: &MetadataConfig,
) -> (Extraction, Option<DecodeError>) {
    let mut extractor = Extractor {
        config,
        out: Extraction::default(),
    };
    let error = extractor.run(buf).err();
    (extractor.out, error)
}

struct Extractor<'c> {
    config: &'c MetadataConfig,
    out: Extraction,
}

impl Extractor<'_> {
    fn run(&mut self, buf: &[u8]) -> Result<()> {
        match find_container(buf)? {
            Some(container) => self.read_container(&container),
            None => {
                debug!("no content container");
                Ok(())
            }
        }
    }

    fn read_container(&mut self, container: &Field<'_>) -> Result<()> {
        let Some(fields) = container.nested() else {
            return Ok(());
        };

        for field in fields {
            let field = field?;
            if field.is(BLOCK_FIELD, WireType::LengthDelimited) {
                self.read_block(&field)?;
            } else {
                debug!(number = field.number, offset = field.offset, "skipping container field");
            }
        }

        Ok(())
    }

    fn read_block(&mut self, block: &Field<'_>) -> Result<()> {
        let mut meta = BlockMetadata::default();
        let result = self.read_block_fields(block, &mut meta);
        self.out.blocks.push(meta);
        result
    }

    fn read_block_fields(&mut self, block: &Field<'_>, meta: &mut BlockMetadata) -> Result<()> {
        let Some(fields) = block.nested() else {
            return Ok(());
        };

        for field in fields {
            let field = field?;
            match (field.number, field.value) {
                (TEXT_FIELD, Value::Bytes(_)) => self.out.push_text(&field),
                (CHECKLIST_FIELD, Value::Varint(v)) => self.out.checklist_states.push(v != 0),
                (CHECKLIST_FIELD, Value::Bytes(payload)) => match packed_values(payload) {
                    Some(values) => self
                        .out
                        .checklist_states
                        .extend(values.into_iter().map(|v| v != 0)),
                    None => meta.absorb(&field, self.config),
                },
                (LEVEL_FIELD, Value::Varint(v)) => self.out.nesting_levels.push(v),
                (LEVEL_FIELD, Value::Bytes(payload)) => match packed_values(payload) {
                    Some(values) => self.out.nesting_levels.extend(values),
                    None => meta.absorb(&field, self.config),
                },
                _ => meta.absorb(&field, self.config),
            }
        }

        Ok(())
    }
}

/// Values of a packed varint array, or `None` when the payload is a nested
/// message or does not decode as varints
fn packed_values(payload: &[u8]) -> Option<Vec<u64>> {
    if is_message(payload) {
        debug!(len = payload.len(), "nested message in an array field");
        return None;
    }
    read_packed(payload).ok()
}

/// First outer field 2 carrying a payload. Later outer fields are not read.
fn find_container(buf: &[u8]) -> Result<Option<Field<'_>>> {
    for field in walk(buf) {
        let field = field?;
        if field.is(CONTAINER_FIELD, WireType::LengthDelimited) {
            return Ok(Some(field));
        }
        debug!(number = field.number, offset = field.offset, "skipping outer field");
    }
    Ok(None)
}
