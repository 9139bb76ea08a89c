use super::{Field, auto_paragraphs, merge_changes};
use crate::form::FormBuffer;
use crate::instance::WidgetInstance;
use crate::registry::{WidgetMetadata, WidgetType};

const FIELDS: &[Field] = &[
    Field::Line("title"),
    Field::Markup("text"),
    Field::Flag("filter"),
];

/// Arbitrary text or markup.
#[derive(Clone, Copy, Debug, Default)]
pub struct Text;

impl WidgetType for Text {
    fn id_base(&self) -> &str {
        "text"
    }

    fn metadata(&self) -> WidgetMetadata {
        WidgetMetadata {
            name: "Text".into(),
            description: "Arbitrary text.".into(),
            ..WidgetMetadata::default()
        }
    }

    fn form(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        out.text_input("Title:", "title", instance.get_str("title").unwrap_or(""))
            .textarea("Content:", "text", instance.get_str("text").unwrap_or(""))
            .checkbox("Automatically add paragraphs", "filter", instance.get_flag("filter"));
    }

    fn update(&self, changes: &WidgetInstance, previous: &WidgetInstance) -> WidgetInstance {
        merge_changes(FIELDS, changes, previous)
    }

    fn display(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        if let Some(title) = instance.get_str("title").filter(|t| !t.is_empty()) {
            out.raw(r#"<h2 class="widgettitle">"#).text(title).raw("</h2>");
        }
        let text = instance.get_str("text").unwrap_or("");
        out.raw(r#"<div class="textwidget">"#);
        if instance.get_flag("filter") {
            out.raw(&auto_paragraphs(text));
        } else {
            // Content is trusted markup.
            out.raw(text);
        }
        out.raw("</div>");
    }
}
