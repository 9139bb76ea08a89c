//! Built-in legacy widget types.
//!
//! Updates merge: a field present in the changes is sanitized and replaces the previous
//! value; an absent field keeps its previous value untouched. Checkbox fields arrive as
//! a hidden `0` optionally followed by `1` and are stored as booleans.

mod archives;
mod search;
mod taxonomy;
mod text;

pub use archives::Archives;
pub use search::Search;
pub use taxonomy::{Categories, TagCloud};
pub use text::Text;

use crate::instance::WidgetInstance;
use crate::registry::WidgetRegistry;
use html::dom_utils::collect_text;
use serde_json::Value;
use std::sync::Arc;

pub fn register_builtins(registry: &mut WidgetRegistry) {
    registry.register("search", Arc::new(Search));
    registry.register("text", Arc::new(Text));
    registry.register("categories", Arc::new(Categories::default()));
    registry.register("archives", Arc::new(Archives::default()));
    registry.register("tag_cloud", Arc::new(TagCloud::default()));
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Field {
    /// Single-line text: tags stripped, whitespace collapsed.
    Line(&'static str),
    /// Multi-line trusted markup: newlines normalized only.
    Markup(&'static str),
    Flag(&'static str),
    /// One of a fixed set of values; anything else falls back to the first.
    Choice(&'static str, &'static [&'static str]),
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Line(n) | Field::Markup(n) | Field::Flag(n) | Field::Choice(n, _) => n,
        }
    }
}

pub(crate) fn merge_changes(
    fields: &[Field],
    changes: &WidgetInstance,
    previous: &WidgetInstance,
) -> WidgetInstance {
    let mut next = previous.clone();
    for &field in fields {
        let name = field.name();
        if !changes.contains(name) {
            continue;
        }
        let value = match field {
            Field::Line(_) => Value::from(sanitize_text_field(changes.get_str(name).unwrap_or(""))),
            Field::Markup(_) => Value::from(normalize_newlines(changes.get_str(name).unwrap_or(""))),
            Field::Flag(_) => Value::from(changes.get_flag(name)),
            Field::Choice(_, allowed) => {
                let submitted = changes.get_str(name).unwrap_or("");
                let chosen = allowed
                    .iter()
                    .find(|v| **v == submitted)
                    .or(allowed.first())
                    .copied()
                    .unwrap_or("");
                Value::from(chosen)
            }
        };
        next.insert(name, value);
    }
    next
}

/// Strip tags, collapse whitespace runs (including line breaks) and trim.
pub fn sanitize_text_field(raw: &str) -> String {
    let mut text = String::new();
    collect_text(&html::parse_fragment(raw), &mut text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_newlines(s: &str) -> String {
    if !s.contains('\r') {
        return s.to_string();
    }
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Wrap blank-line separated blocks in paragraphs.
pub(crate) fn auto_paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| format!("<p>{}</p>", block.replace('\n', "<br>\n")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_tags_and_collapses_whitespace() {
        assert_eq!(sanitize_text_field("  <b>Find</b>\n\tstuff  "), "Find stuff");
        assert_eq!(sanitize_text_field("a &amp; b"), "a & b");
        assert_eq!(sanitize_text_field(""), "");
    }

    #[test]
    fn merge_keeps_absent_fields_and_sanitizes_present_ones() {
        const FIELDS: &[Field] = &[
            Field::Line("title"),
            Field::Flag("count"),
            Field::Choice("kind", &["a", "b"]),
        ];
        let previous: WidgetInstance = serde_json::from_value(serde_json::json!({
            "title": "Old",
            "count": true,
            "extra": "kept",
        }))
        .unwrap();
        let changes: WidgetInstance = serde_json::from_value(serde_json::json!({
            "count": "0",
            "kind": "zzz",
        }))
        .unwrap();

        let next = merge_changes(FIELDS, &changes, &previous);
        assert_eq!(next.get_str("title"), Some("Old"));
        assert_eq!(next.get("count"), Some(&Value::Bool(false)));
        assert_eq!(next.get_str("kind"), Some("a"));
        assert_eq!(next.get_str("extra"), Some("kept"));

        assert_eq!(merge_changes(FIELDS, &WidgetInstance::new(), &previous), previous);
    }

    #[test]
    fn auto_paragraphs_splits_blocks() {
        assert_eq!(auto_paragraphs("one\ntwo\n\nthree"), "<p>one<br>\ntwo</p>\n<p>three</p>");
    }
}
