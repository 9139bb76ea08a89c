use super::{Field, merge_changes};
use crate::form::FormBuffer;
use crate::instance::WidgetInstance;
use crate::registry::{WidgetMetadata, WidgetType};

const FIELDS: &[Field] = &[Field::Line("title")];

/// Site search form.
#[derive(Clone, Copy, Debug, Default)]
pub struct Search;

impl WidgetType for Search {
    fn id_base(&self) -> &str {
        "search"
    }

    fn metadata(&self) -> WidgetMetadata {
        WidgetMetadata {
            name: "Search".into(),
            description: "A search form for your site.".into(),
            ..WidgetMetadata::default()
        }
    }

    fn form(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        out.text_input("Title:", "title", instance.get_str("title").unwrap_or(""));
    }

    fn update(&self, changes: &WidgetInstance, previous: &WidgetInstance) -> WidgetInstance {
        merge_changes(FIELDS, changes, previous)
    }

    fn display(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        if let Some(title) = instance.get_str("title").filter(|t| !t.is_empty()) {
            out.raw(r#"<h2 class="widgettitle">"#).text(title).raw("</h2>");
        }
        out.raw(concat!(
            r#"<form role="search" method="get" class="search-form" action="/">"#,
            r#"<label><span class="screen-reader-text">Search for:</span>"#,
            r#"<input type="search" class="search-field" name="s" value=""></label>"#,
            r#"<input type="submit" class="search-submit" value="Search"></form>"#,
        ));
    }
}
