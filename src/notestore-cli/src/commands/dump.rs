//! Diagnostic commands: raw field tree and metadata summary of a note body

use anyhow::{bail, Context, Result};
use notestore::MetadataConfig;
use std::fs;
use std::path::PathBuf;

use crate::cli::{OutputFormat, SourceArgs};
use crate::repo::NoteRepository;
use crate::view::{format_metadata, ViewResult};

/// Where to read a note body from, resolved from the CLI source group
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Note(i64),
}

impl Source {
    pub fn from_args(args: SourceArgs) -> Result<Self> {
        match (args.file, args.id) {
            (Some(path), None) => Ok(Source::File(path)),
            (None, Some(id)) => Ok(Source::Note(id)),
            _ => bail!("Specify either a file or --id"),
        }
    }

    pub fn needs_database(&self) -> bool {
        matches!(self, Source::Note(_))
    }

    /// Read the raw body; `repo` must be given for [`Source::Note`]
    pub fn load(&self, repo: Option<&NoteRepository>) -> Result<Vec<u8>> {
        match self {
            Source::File(path) => {
                fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
            }
            Source::Note(id) => {
                let repo = repo.context("No database available")?;
                let Some(record) = repo.find_by_id(*id)? else {
                    bail!("Note with ID {} not found", id);
                };
                record
                    .content
                    .with_context(|| format!("Note {} has no stored body", id))
            }
        }
    }
}

/// Print every field of the body, descending into nested messages
pub fn dump(data: &[u8], format: OutputFormat) -> Result<ViewResult> {
    let nodes = notestore::inspect(data)?;

    let content = match format {
        OutputFormat::Pretty => notestore::render_tree(&nodes)?,
        OutputFormat::Json => serde_json::to_string_pretty(&nodes)? + "\n",
    };
    Ok(ViewResult::success(content))
}

/// Print the classified metadata scalars of the body
pub fn meta(data: &[u8], format: OutputFormat, config: &MetadataConfig) -> Result<ViewResult> {
    let summary = notestore::analyze_metadata_with(data, config)?;

    let content = match format {
        OutputFormat::Pretty => format_metadata(&summary)?,
        OutputFormat::Json => serde_json::to_string_pretty(&summary)? + "\n",
    };
    Ok(ViewResult::success(content))
}
