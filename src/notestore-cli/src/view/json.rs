//! Pretty-printed JSON output

use anyhow::Result;
use serde_json::json;

use super::{error_name, NoteViewData, View, ViewResult};

pub struct JsonView;

impl View for JsonView {
    fn render(&self, data: &NoteViewData) -> Result<ViewResult> {
        let mut content = serde_json::to_string_pretty(data)?;
        content.push('\n');
        Ok(ViewResult::success(content))
    }

    fn format_error(&self, error: &anyhow::Error) -> String {
        let body = json!({
            "error": {
                "message": format!("{error:#}"),
                "name": error_name(error),
            }
        });
        // Serializing a `Value` cannot fail
        serde_json::to_string_pretty(&body).unwrap_or_default() + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::RepoError;
    use crate::view::tests::{checklist_body, record};
    use crate::view::RenderedNote;
    use notestore::DecodeOptions;
    use serde_json::Value;

    #[test]
    fn test_render_notes() {
        let data = NoteViewData {
            notes: vec![RenderedNote::from_record(
                record(1, Some(checklist_body())),
                &DecodeOptions::default(),
                false,
            )],
            search_term: Some("milk".to_string()),
            total_count: Some(1),
        };
        let result = JsonView.render(&data).unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(result.content.ends_with('\n'));

        let value: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(value["searchTerm"], "milk");
        assert_eq!(value["totalCount"], 1);

        let note = &value["notes"][0];
        assert_eq!(note["id"], 1);
        assert_eq!(note["modifiedDate"], "2024-06-15 12:00:00");
        assert_eq!(note["hasChecklist"], false);
        assert_eq!(note["items"][0]["text"], "milk");
        assert_eq!(note["items"][0]["isChecked"], true);
        assert_eq!(note["items"][0]["isChecklistItem"], true);
        assert!(note["content"].is_string());
        assert!(note.get("metadata").is_none());
        assert!(note.get("decodeError").is_none());
    }

    #[test]
    fn test_render_omits_absent_fields() {
        let data = NoteViewData {
            notes: vec![RenderedNote::from_record(
                record(2, None),
                &DecodeOptions::default(),
                false,
            )],
            ..Default::default()
        };
        let value: Value = serde_json::from_str(&JsonView.render(&data).unwrap().content).unwrap();

        assert!(value.get("searchTerm").is_none());
        assert!(value.get("totalCount").is_none());
        assert!(value["notes"][0]["content"].is_null());
    }

    #[test]
    fn test_format_error() {
        let err = anyhow::Error::new(RepoError::InvalidParams("limit must be positive".into()));
        let value: Value = serde_json::from_str(&JsonView.format_error(&err)).unwrap();

        assert_eq!(value["error"]["name"], "ValidationError");
        assert_eq!(
            value["error"]["message"],
            "Invalid search parameters: limit must be positive"
        );
    }
}
