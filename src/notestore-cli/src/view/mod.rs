//! Output rendering for note results
//!
//! Commands collect [`RenderedNote`]s into a [`NoteViewData`] and hand it to
//! the [`View`] for the selected [`OutputFormat`].

mod json;
mod pretty;
pub mod styles;

pub use json::JsonView;
pub use pretty::{format_metadata, PrettyView};

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use notestore::{DecodeError, DecodeOptions, MetadataSummary, NoteItem};
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::cli::OutputFormat;
use crate::repo::{NoteRecord, RepoError};

/// Final text to print and the process exit code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewResult {
    pub content: String,
    pub exit_code: i32,
}

impl ViewResult {
    pub fn success(content: String) -> Self {
        Self {
            content,
            exit_code: 0,
        }
    }

    pub fn failure(content: String) -> Self {
        Self {
            content,
            exit_code: 1,
        }
    }
}

pub trait View {
    fn render(&self, data: &NoteViewData) -> Result<ViewResult>;

    fn format_error(&self, error: &anyhow::Error) -> String;

    fn error_result(&self, error: &anyhow::Error) -> ViewResult {
        ViewResult::failure(self.format_error(error))
    }
}

pub fn create_view(format: OutputFormat) -> Box<dyn View> {
    match format {
        OutputFormat::Pretty => Box::new(PrettyView),
        OutputFormat::Json => Box::new(JsonView),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteViewData {
    pub notes: Vec<RenderedNote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
}

/// A note row together with its decoded body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNote {
    pub id: i64,
    pub title: String,
    pub snippet: Option<String>,
    pub identifier: String,
    pub modified_date: String,
    #[serde(serialize_with = "serialize_base64")]
    pub content: Option<Vec<u8>>,
    pub has_checklist: bool,
    pub items: Vec<NoteItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

impl RenderedNote {
    /// Decode the body of `record`.
    ///
    /// A decode failure is logged and recorded on the note rather than
    /// returned; views then fall back to the snippet.
    pub fn from_record(record: NoteRecord, options: &DecodeOptions, with_metadata: bool) -> Self {
        let mut items = Vec::new();
        let mut metadata = None;
        let mut decode_error = None;

        if let Some(content) = &record.content {
            match decode_note(content, options, with_metadata) {
                Ok((decoded, summary)) => {
                    items = decoded;
                    metadata = summary;
                }
                Err(err) => {
                    warn!(id = record.id, error = %err, "failed to decode note body");
                    decode_error = Some(err.to_string());
                }
            }
        }

        Self {
            id: record.id,
            title: record.title,
            snippet: record.snippet,
            identifier: record.identifier,
            modified_date: record.modified_date,
            content: record.content,
            has_checklist: record.has_checklist,
            items,
            metadata,
            decode_error,
        }
    }

    /// True when the body should be replaced by the stored snippet
    pub fn uses_snippet(&self) -> bool {
        self.items.iter().all(NoteItem::is_blank)
    }
}

fn decode_note(
    content: &[u8],
    options: &DecodeOptions,
    with_metadata: bool,
) -> notestore::Result<(Vec<NoteItem>, Option<MetadataSummary>)> {
    let items = notestore::decode_with(content, options)?;
    let metadata = if with_metadata {
        Some(notestore::analyze_metadata_with(content, &options.metadata)?)
    } else {
        None
    };
    Ok((items, metadata))
}

fn serialize_base64<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match data {
        Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Short type name for an error, shown alongside its message
pub fn error_name(error: &anyhow::Error) -> &'static str {
    if let Some(err) = error.downcast_ref::<RepoError>() {
        return match err {
            RepoError::Database(_) => "DatabaseError",
            RepoError::InvalidParams(_) | RepoError::InvalidRow { .. } => "ValidationError",
        };
    }
    if error.downcast_ref::<DecodeError>().is_some() {
        return "DecodeError";
    }
    if error.downcast_ref::<std::io::Error>().is_some() {
        return "IoError";
    }
    "Error"
}
