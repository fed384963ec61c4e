//! Turns note text plus the checklist/nesting arrays into note items.
//!
//! The format never says which lines are checklist items. Checklist states
//! are handed out to non-empty lines in document order until they run out,
//! and nesting levels are read by raw line index.

use serde::{Deserialize, Serialize};

/// Inline formatting marker stripped from note text
pub const FORMAT_MARKER: char = '\u{1}';

pub const LINE_SEPARATOR: char = '\n';

/// Byte order mark; trimmed from line ends along with whitespace
const BYTE_ORDER_MARK: char = '\u{feff}';

/// One logical line of a note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteItem {
    pub text: String,
    pub is_checked: bool,
    pub level: u64,
    pub is_checklist_item: bool,
}

impl NoteItem {
    pub fn plain(text: impl Into<String>, level: u64) -> Self {
        Self {
            text: text.into(),
            level,
            ..Default::default()
        }
    }

    pub fn checklist(text: impl Into<String>, is_checked: bool, level: u64) -> Self {
        Self {
            text: text.into(),
            is_checked,
            level,
            is_checklist_item: true,
        }
    }

    /// Separator between paragraphs
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Reconstructed items and how much of each array went unused
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconstruction {
    pub items: Vec<NoteItem>,
    pub unused_states: usize,
    pub unused_levels: usize,
}

impl Reconstruction {
    /// True when neither array has entries past what the text accounts for
    pub fn is_aligned(&self) -> bool {
        self.unused_states == 0 && self.unused_levels == 0
    }
}

pub fn reconstruct(text: &str, states: &[bool], levels: &[u64]) -> Reconstruction {
    let text: String = text.chars().filter(|&c| c != FORMAT_MARKER).collect();
    let mut items: Vec<NoteItem> = Vec::new();
    let mut states_iter = states.iter().copied();
    let mut line_count = 0;

    for (i, line) in text.split(LINE_SEPARATOR).enumerate() {
        line_count += 1;
        let line = line.trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK);

        if line.is_empty() {
            if items.last().is_some_and(|prev| !prev.is_blank()) {
                items.push(NoteItem::blank());
            }
            continue;
        }

        let level = levels.get(i).copied().unwrap_or(0);
        let item = match states_iter.next() {
            Some(checked) => NoteItem::checklist(line, checked, level),
            None => NoteItem::plain(line, level),
        };
        items.push(item);
    }

    Reconstruction {
        items,
        unused_states: states_iter.len(),
        unused_levels: levels.len().saturating_sub(line_count),
    }
}
