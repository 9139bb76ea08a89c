use super::{Field, merge_changes};
use crate::form::FormBuffer;
use crate::instance::WidgetInstance;
use crate::registry::{WidgetMetadata, WidgetType};

const FIELDS: &[Field] = &[
    Field::Line("title"),
    Field::Flag("count"),
    Field::Flag("dropdown"),
];

/// Monthly archive links.
#[derive(Clone, Debug)]
pub struct Archives {
    /// `(label, url, post count)`, newest first.
    months: Vec<(String, String, u32)>,
}

impl Archives {
    pub fn new(months: Vec<(String, String, u32)>) -> Self {
        Self { months }
    }
}

impl Default for Archives {
    fn default() -> Self {
        Self::new(vec![("January 2024".into(), "/2024/01/".into(), 1)])
    }
}

impl WidgetType for Archives {
    fn id_base(&self) -> &str {
        "archives"
    }

    fn metadata(&self) -> WidgetMetadata {
        WidgetMetadata {
            name: "Archives".into(),
            description: "A monthly archive of your site's Posts.".into(),
            ..WidgetMetadata::default()
        }
    }

    fn form(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        out.text_input("Title:", "title", instance.get_str("title").unwrap_or(""))
            .checkbox("Display as dropdown", "dropdown", instance.get_flag("dropdown"))
            .checkbox("Show post counts", "count", instance.get_flag("count"));
    }

    fn update(&self, changes: &WidgetInstance, previous: &WidgetInstance) -> WidgetInstance {
        merge_changes(FIELDS, changes, previous)
    }

    fn display(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        let title = instance.get_str("title").filter(|t| !t.is_empty()).unwrap_or("Archives");
        out.raw(r#"<h2 class="widgettitle">"#).text(title).raw("</h2>");
        let count = instance.get_flag("count");
        let dropdown = instance.get_flag("dropdown");
        out.raw(if dropdown { "<select name=\"archive-dropdown\">" } else { "<ul>" });
        for (label, url, posts) in &self.months {
            let caption = if count {
                format!("{label} ({posts})")
            } else {
                label.clone()
            };
            if dropdown {
                out.raw(&format!(r#"<option value="{}">"#, html::attr_escaped(url)))
                    .text(&caption)
                    .raw("</option>");
            } else {
                out.raw(&format!(r#"<li><a href="{}">"#, html::attr_escaped(url)))
                    .text(&caption)
                    .raw("</a></li>");
            }
        }
        out.raw(if dropdown { "</select>" } else { "</ul>" });
    }
}
