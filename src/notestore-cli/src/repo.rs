//! Read-only access to the Notes SQLite store.
//!
//! Note rows live in `ZICCLOUDSYNCINGOBJECT`; their compressed bodies are in
//! `ZICNOTEDATA.ZDATA`. Dates are Core Data timestamps (seconds since
//! 2001-01-01), shifted to the Unix epoch in SQL.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid search parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid note row {id}: {reason}")]
    InvalidRow { id: i64, reason: &'static str },
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

const NOTE_SELECT_COLUMNS: &str = "
    cs.Z_PK,
    cs.ZTITLE1,
    cs.ZSNIPPET,
    cs.ZIDENTIFIER,
    datetime(cs.ZMODIFICATIONDATE1 + 978307200, 'unixepoch', 'localtime'),
    nd.ZDATA,
    cs.ZHASCHECKLIST";

const NOT_DELETED: &str = "(cs.ZMARKEDFORDELETION = 0 OR cs.ZMARKEDFORDELETION IS NULL)";

/// Rows that can become a [`NoteRecord`]; folders and attachments share the table
const LISTABLE: &str =
    "(cs.ZTITLE1 IS NOT NULL AND cs.ZTITLE1 <> '' AND cs.ZIDENTIFIER IS NOT NULL)";

const MATCHES_TERM: &str = "(LOWER(cs.ZTITLE1) LIKE ?1 ESCAPE '\\' OR LOWER(cs.ZSNIPPET) LIKE ?1 ESCAPE '\\')";

/// One note row with its raw (still compressed) body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: i64,
    pub title: String,
    pub snippet: Option<String>,
    pub identifier: String,
    pub modified_date: String,
    pub content: Option<Vec<u8>>,
    pub has_checklist: bool,
}

/// Columns as stored, before validation
struct RawRow {
    id: i64,
    title: Option<String>,
    snippet: Option<String>,
    identifier: Option<String>,
    modified_date: Option<String>,
    content: Option<Vec<u8>>,
    has_checklist: Option<i64>,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        title: row.get(1)?,
        snippet: row.get(2)?,
        identifier: row.get(3)?,
        modified_date: row.get(4)?,
        content: row.get(5)?,
        has_checklist: row.get(6)?,
    })
}

impl TryFrom<RawRow> for NoteRecord {
    type Error = RepoError;

    fn try_from(raw: RawRow) -> RepoResult<Self> {
        let title = raw
            .title
            .filter(|t| !t.is_empty())
            .ok_or(RepoError::InvalidRow {
                id: raw.id,
                reason: "missing title",
            })?;
        let identifier = raw.identifier.ok_or(RepoError::InvalidRow {
            id: raw.id,
            reason: "missing identifier",
        })?;

        Ok(Self {
            id: raw.id,
            title,
            snippet: raw.snippet,
            identifier,
            modified_date: raw.modified_date.unwrap_or_default(),
            content: raw.content,
            has_checklist: raw.has_checklist.unwrap_or(0) != 0,
        })
    }
}

/// Validated search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub term: String,
    pub limit: usize,
    pub offset: usize,
}

impl SearchParams {
    pub fn new(term: impl Into<String>, limit: usize, offset: usize) -> RepoResult<Self> {
        if limit == 0 {
            return Err(RepoError::InvalidParams("limit must be positive".to_string()));
        }

        Ok(Self {
            term: term.into(),
            limit,
            offset,
        })
    }
}

/// LIKE pattern matching `term` anywhere, with wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

pub struct NoteRepository {
    conn: Connection,
}

impl NoteRepository {
    /// Open the store read-only
    pub fn open<P: AsRef<Path>>(path: P) -> RepoResult<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn find_by_id(&self, id: i64) -> RepoResult<Option<NoteRecord>> {
        let sql = format!(
            "SELECT {NOTE_SELECT_COLUMNS}
             FROM ZICCLOUDSYNCINGOBJECT cs
             LEFT JOIN ZICNOTEDATA nd ON cs.Z_PK = nd.ZNOTE
             WHERE cs.Z_PK = ?1 AND {NOT_DELETED}"
        );

        let raw = self
            .conn
            .query_row(&sql, params![id], row_to_raw)
            .optional()?;

        raw.map(NoteRecord::try_from).transpose()
    }

    /// Notes whose title or snippet contains the term, newest first
    pub fn search(&self, params: &SearchParams) -> RepoResult<Vec<NoteRecord>> {
        let sql = format!(
            "SELECT {NOTE_SELECT_COLUMNS}
             FROM ZICCLOUDSYNCINGOBJECT cs
             LEFT JOIN ZICNOTEDATA nd ON cs.Z_PK = nd.ZNOTE
             WHERE {NOT_DELETED} AND {LISTABLE} AND {MATCHES_TERM}
             ORDER BY cs.ZMODIFICATIONDATE1 DESC
             LIMIT ?2 OFFSET ?3"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                like_pattern(&params.term),
                to_sql_int(params.limit),
                to_sql_int(params.offset)
            ],
            row_to_raw,
        )?;

        rows.map(|row| NoteRecord::try_from(row?)).collect()
    }

    /// Number of notes matching the term, ignoring limit/offset
    pub fn count(&self, term: &str) -> RepoResult<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM ZICCLOUDSYNCINGOBJECT cs
             WHERE {NOT_DELETED} AND {LISTABLE} AND {MATCHES_TERM}"
        );

        let total: i64 = self
            .conn
            .query_row(&sql, params![like_pattern(term)], |row| row.get(0))?;
        Ok(usize::try_from(total).unwrap_or(0))
    }
}
