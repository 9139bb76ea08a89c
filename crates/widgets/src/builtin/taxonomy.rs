use super::{Field, merge_changes};
use crate::form::FormBuffer;
use crate::instance::WidgetInstance;
use crate::registry::{WidgetMetadata, WidgetType};

const CATEGORY_FIELDS: &[Field] = &[
    Field::Line("title"),
    Field::Flag("count"),
    Field::Flag("hierarchical"),
    Field::Flag("dropdown"),
];

const TAXONOMIES: &[&str] = &["post_tag", "category"];

const TAG_CLOUD_FIELDS: &[Field] = &[
    Field::Line("title"),
    Field::Choice("taxonomy", TAXONOMIES),
    Field::Flag("count"),
];

/// `(name, post count)` pairs shown by the taxonomy widgets.
pub type Terms = Vec<(String, u32)>;

fn write_terms(out: &mut FormBuffer<'_>, terms: &Terms, count: bool) {
    out.raw("<ul>");
    for (name, posts) in terms {
        out.raw("<li>").text(name);
        if count {
            out.text(&format!(" ({posts})"));
        }
        out.raw("</li>");
    }
    out.raw("</ul>");
}

/// Category list or dropdown.
#[derive(Clone, Debug)]
pub struct Categories {
    terms: Terms,
}

impl Categories {
    pub fn new(terms: Terms) -> Self {
        Self { terms }
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self::new(vec![("Uncategorized".into(), 1)])
    }
}

impl WidgetType for Categories {
    fn id_base(&self) -> &str {
        "categories"
    }

    fn metadata(&self) -> WidgetMetadata {
        WidgetMetadata {
            name: "Categories".into(),
            description: "A list or dropdown of categories.".into(),
            ..WidgetMetadata::default()
        }
    }

    fn form(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        out.text_input("Title:", "title", instance.get_str("title").unwrap_or(""))
            .checkbox("Display as dropdown", "dropdown", instance.get_flag("dropdown"))
            .checkbox("Show post counts", "count", instance.get_flag("count"))
            .checkbox("Show hierarchy", "hierarchical", instance.get_flag("hierarchical"));
    }

    fn update(&self, changes: &WidgetInstance, previous: &WidgetInstance) -> WidgetInstance {
        merge_changes(CATEGORY_FIELDS, changes, previous)
    }

    fn display(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        let title = instance.get_str("title").filter(|t| !t.is_empty()).unwrap_or("Categories");
        out.raw(r#"<h2 class="widgettitle">"#).text(title).raw("</h2>");
        let count = instance.get_flag("count");
        if instance.get_flag("dropdown") {
            out.raw(r#"<select name="cat"><option value="-1">Select Category</option>"#);
            for (name, posts) in &self.terms {
                let caption = if count { format!("{name} ({posts})") } else { name.clone() };
                out.raw("<option>").text(&caption).raw("</option>");
            }
            out.raw("</select>");
        } else {
            write_terms(out, &self.terms, count);
        }
    }
}

/// Cloud of the most used terms of one taxonomy.
#[derive(Clone, Debug)]
pub struct TagCloud {
    tags: Terms,
    categories: Terms,
}

impl TagCloud {
    pub fn new(tags: Terms, categories: Terms) -> Self {
        Self { tags, categories }
    }
}

impl Default for TagCloud {
    fn default() -> Self {
        Self::new(Vec::new(), vec![("Uncategorized".into(), 1)])
    }
}

impl WidgetType for TagCloud {
    fn id_base(&self) -> &str {
        "tag_cloud"
    }

    fn metadata(&self) -> WidgetMetadata {
        WidgetMetadata {
            name: "Tag Cloud".into(),
            description: "A cloud of your most used tags.".into(),
            ..WidgetMetadata::default()
        }
    }

    fn form(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        let taxonomy = instance.get_str("taxonomy").unwrap_or(TAXONOMIES[0]);
        out.text_input("Title:", "title", instance.get_str("title").unwrap_or(""))
            .select(
                "Taxonomy:",
                "taxonomy",
                &[("post_tag", "Tags"), ("category", "Categories")],
                taxonomy,
            )
            .checkbox("Show tag counts", "count", instance.get_flag("count"));
    }

    fn update(&self, changes: &WidgetInstance, previous: &WidgetInstance) -> WidgetInstance {
        merge_changes(TAG_CLOUD_FIELDS, changes, previous)
    }

    fn display(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        let terms = match instance.get_str("taxonomy") {
            Some("category") => &self.categories,
            _ => &self.tags,
        };
        let title = instance.get_str("title").filter(|t| !t.is_empty()).unwrap_or("Tags");
        out.raw(r#"<h2 class="widgettitle">"#).text(title).raw("</h2>");
        if terms.is_empty() {
            out.raw("<p>There are no tags to display.</p>");
            return;
        }
        write_terms(out, terms, instance.get_flag("count"));
    }
}
