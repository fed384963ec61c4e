//! ANSI-styled terminal output

use anyhow::Result;
use notestore::{FormatData, MetadataSummary, NoteItem};
use std::fmt::Write as _;

use super::styles::*;
use super::{NoteViewData, RenderedNote, View, ViewResult};

pub struct PrettyView;

impl View for PrettyView {
    fn render(&self, data: &NoteViewData) -> Result<ViewResult> {
        if data.notes.is_empty() {
            return Ok(ViewResult::success(format!(
                "{GRAY}No notes found matching your search.{RESET}\n"
            )));
        }

        let mut out = String::new();
        let separator = SEPARATOR.repeat(SEPARATOR_WIDTH);

        if let Some(term) = &data.search_term {
            let term = if term.is_empty() { "all" } else { term };
            writeln!(out, "\nSearch results for \"{CYAN}{term}{RESET}\":")?;
        }

        for note in &data.notes {
            writeln!(out, "\n{GRAY}{separator}{RESET}")?;
            write_note(&mut out, note)?;
        }

        writeln!(out, "\n{GRAY}{separator}{RESET}")?;
        let count = data.notes.len();
        write!(
            out,
            "{CYAN}Found {count} matching note{}",
            if count == 1 { "" } else { "s" }
        )?;
        if let Some(total) = data.total_count {
            write!(out, " (of {total} total)")?;
        }
        writeln!(out, "{RESET}")?;

        Ok(ViewResult::success(out))
    }

    fn format_error(&self, error: &anyhow::Error) -> String {
        format!("{RED}Error: {error:#}{RESET}\n")
    }
}

fn write_note(out: &mut String, note: &RenderedNote) -> std::fmt::Result {
    writeln!(out, "{BOLD}{}{RESET}", note.title)?;
    writeln!(out, "{GRAY}Modified: {}{RESET}\n", note.modified_date)?;

    if note.uses_snippet() {
        out.push_str(note.snippet.as_deref().unwrap_or_default());
    } else {
        let body: Vec<String> = note.items.iter().map(format_item).collect();
        out.push_str(&body.join("\n"));
    }
    out.push('\n');

    if let Some(error) = &note.decode_error {
        writeln!(out, "{RED}Could not decode body: {error}{RESET}")?;
    }
    if let Some(meta) = &note.metadata {
        write_metadata(out, meta)?;
    }

    Ok(())
}

fn format_item(item: &NoteItem) -> String {
    if item.is_blank() {
        return String::new();
    }

    let indent = INDENT.repeat(usize::try_from(item.level).unwrap_or(0));
    if !item.is_checklist_item {
        return format!("{indent}{WHITE}{}{RESET}", item.text);
    }

    let (checkbox, text_color) = if item.is_checked {
        (format!("{GREEN}{CHECKED}{RESET}"), DIM)
    } else {
        (format!("{GRAY}{UNCHECKED}{RESET}"), WHITE)
    };
    format!("{indent}{checkbox} {text_color}{}{RESET}", item.text)
}

/// Metadata block on its own, for the `meta` command
pub fn format_metadata(meta: &MetadataSummary) -> Result<String> {
    let mut out = String::new();
    write_metadata(&mut out, meta)?;
    Ok(out)
}

fn write_metadata(out: &mut String, meta: &MetadataSummary) -> std::fmt::Result {
    writeln!(out, "\n{GRAY}Metadata:")?;
    if let Some(version) = meta.format_version {
        writeln!(out, "  format version: {version}")?;
    }
    if let Some(created) = meta.created {
        writeln!(out, "  created: {created}")?;
    }
    if let Some(modified) = meta.modified {
        writeln!(out, "  modified: {modified}")?;
    }
    write_list(out, "other timestamps", &meta.other_timestamps)?;
    write_list(out, "type flags", &meta.type_flags)?;
    write_list(out, "state flags", &meta.state_flags)?;
    write_list(out, "references", &meta.references)?;
    for format in &meta.formats {
        write_format(out, format)?;
    }
    write!(out, "{RESET}")
}

fn write_format(out: &mut String, format: &FormatData) -> std::fmt::Result {
    writeln!(out, "  format header: {}", hex_bytes(&format.header))?;
    for marker in &format.markers {
        writeln!(
            out,
            "    marker 0x{:02x} @{}: {}",
            marker.kind,
            marker.offset,
            hex_bytes(&marker.raw)
        )?;
    }
    Ok(())
}

fn hex_bytes(bytes: &[u8]) -> String {
    let bytes: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
    bytes.join(" ")
}

fn write_list(out: &mut String, label: &str, values: &[u64]) -> std::fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    let values: Vec<String> = values.iter().map(u64::to_string).collect();
    writeln!(out, "  {label}: {}", values.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tests::{checklist_body, record};
    use crate::view::RenderedNote;
    use notestore::DecodeOptions;

    fn rendered(id: i64, content: Option<Vec<u8>>) -> RenderedNote {
        RenderedNote::from_record(record(id, content), &DecodeOptions::default(), false)
    }

    #[test]
    fn test_empty_result() {
        let result = PrettyView.render(&NoteViewData::default()).unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(result.content.contains("No notes found matching your search."));
    }

    #[test]
    fn test_search_header_and_footer() {
        let data = NoteViewData {
            notes: vec![rendered(1, Some(checklist_body()))],
            search_term: Some(String::new()),
            total_count: Some(4),
        };
        let out = PrettyView.render(&data).unwrap().content;

        assert!(out.contains(&format!("Search results for \"{CYAN}all{RESET}\"")));
        assert!(out.contains(&SEPARATOR.repeat(SEPARATOR_WIDTH)));
        assert!(out.contains(&format!("{BOLD}Note 1{RESET}")));
        assert!(out.contains("Found 1 matching note (of 4 total)"));
        assert!(out.contains(&format!("{GREEN}{CHECKED}{RESET} {DIM}milk{RESET}")));
    }

    #[test]
    fn test_plural_footer_without_total() {
        let data = NoteViewData {
            notes: vec![rendered(1, None), rendered(2, None)],
            ..Default::default()
        };
        let out = PrettyView.render(&data).unwrap().content;

        assert!(!out.contains("Search results"));
        assert!(out.contains("Found 2 matching notes"));
        assert!(!out.contains("total)"));
    }

    #[test]
    fn test_snippet_fallback() {
        let data = NoteViewData {
            notes: vec![rendered(1, Some(vec![0x12, 0x02, 0x1b]))],
            ..Default::default()
        };
        let out = PrettyView.render(&data).unwrap().content;

        assert!(out.contains("preview"));
        assert!(out.contains("Could not decode body"));
    }

    #[test]
    fn test_format_item() {
        assert_eq!(format_item(&NoteItem::blank()), "");
        assert_eq!(
            format_item(&NoteItem::plain("sub", 2)),
            format!("    {WHITE}sub{RESET}")
        );
        assert_eq!(
            format_item(&NoteItem::checklist("todo", false, 1)),
            format!("  {GRAY}{UNCHECKED}{RESET} {WHITE}todo{RESET}")
        );
    }

    #[test]
    fn test_format_metadata() {
        let meta = MetadataSummary {
            format_version: Some(3),
            created: Some(1_710_000_000),
            type_flags: vec![67],
            references: vec![7, 8],
            ..Default::default()
        };
        let out = format_metadata(&meta).unwrap();

        assert!(out.contains("format version: 3"));
        assert!(out.contains("created: 1710000000"));
        assert!(out.contains("type flags: 67"));
        assert!(out.contains("references: 7, 8"));
        assert!(!out.contains("modified:"));
        assert!(!out.contains("state flags"));
        assert!(!out.contains("format header"));
    }

    #[test]
    fn test_format_metadata_shows_markers() {
        let meta = MetadataSummary {
            formats: FormatData::parse(&[0x14, 0x18, 0x01, 0x4a, 0x10, 0x00, 0x2e, 0xfd, 0x40])
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let out = format_metadata(&meta).unwrap();

        assert!(out.contains("  format header: 14 18 01 4a 10\n"));
        assert!(out.contains("    marker 0x2e @6: 2e fd 40\n"));
    }

    #[test]
    fn test_format_error() {
        let err = anyhow::anyhow!("Note with ID 9 not found");
        assert_eq!(
            PrettyView.format_error(&err),
            format!("{RED}Error: Note with ID 9 not found{RESET}\n")
        );
        assert_eq!(PrettyView.error_result(&err).exit_code, 1);
    }
}
