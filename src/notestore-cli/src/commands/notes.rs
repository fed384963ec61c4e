//! Search and get command handlers

use anyhow::{bail, Result};
use notestore::DecodeOptions;
use tracing::debug;

use crate::repo::{NoteRepository, SearchParams};
use crate::view::{NoteViewData, RenderedNote, View, ViewResult};

/// Search notes by title or snippet
pub fn search(
    repo: &NoteRepository,
    view: &dyn View,
    options: &DecodeOptions,
    term: &str,
    limit: usize,
    offset: usize,
) -> Result<ViewResult> {
    let params = SearchParams::new(term, limit, offset)?;
    let records = repo.search(&params)?;
    let total = repo.count(&params.term)?;
    debug!(term, found = records.len(), total, "search complete");

    let notes = records
        .into_iter()
        .map(|record| RenderedNote::from_record(record, options, false))
        .collect();

    view.render(&NoteViewData {
        notes,
        search_term: Some(params.term),
        total_count: (total > 0).then_some(total),
    })
}

/// Show one note by ID
pub fn get(
    repo: &NoteRepository,
    view: &dyn View,
    options: &DecodeOptions,
    id: i64,
    with_metadata: bool,
) -> Result<ViewResult> {
    let Some(record) = repo.find_by_id(id)? else {
        bail!("Note with ID {} not found", id);
    };

    view.render(&NoteViewData {
        notes: vec![RenderedNote::from_record(record, options, with_metadata)],
        ..Default::default()
    })
}
