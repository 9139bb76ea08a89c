//! Widget type registry.
//!
//! The registry only maps identifiers to capability sets; the renderer calls into it and
//! never manages widget type lifecycles.

use crate::error::RenderError;
use crate::form::FormBuffer;
use crate::instance::WidgetInstance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetMetadata {
    pub name: String,
    pub description: String,
    /// Hidden types exist for compatibility but are not offered in pickers.
    #[serde(default)]
    pub is_hidden: bool,
    /// Reference types are addressed by identifier rather than by `id_base`.
    #[serde(default)]
    pub is_reference: bool,
}

/// A registered legacy widget type.
pub trait WidgetType: Send + Sync {
    fn id_base(&self) -> &str;

    fn metadata(&self) -> WidgetMetadata;

    /// Write the admin form for `instance`.
    fn form(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>);

    /// Produce the new canonical instance from submitted changes.
    ///
    /// The result is authoritative. The default keeps the submitted changes as-is.
    fn update(&self, changes: &WidgetInstance, _previous: &WidgetInstance) -> WidgetInstance {
        changes.clone()
    }

    /// Write the front-end output for `instance`.
    fn display(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
        if let Some(title) = instance.get_str("title").filter(|t| !t.is_empty()) {
            out.raw(r#"<h2 class="widgettitle">"#).text(title).raw("</h2>");
        }
    }
}

/// Whether `identifier` can name a widget type: `[A-Za-z_][A-Za-z0-9_]*`, where any
/// character from U+007F up counts as a letter.
pub fn is_valid_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let word = |c: char| c == '_' || c.is_ascii_alphabetic() || c >= '\u{7f}';
    word(first) && chars.all(|c| word(c) || c.is_ascii_digit())
}

#[derive(Clone)]
enum Registration {
    Widget(Arc<dyn WidgetType>),
    /// Identifier is taken by something that cannot render a widget form.
    Placeholder { name: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableWidget {
    pub identifier: String,
    #[serde(flatten)]
    pub metadata: WidgetMetadata,
}

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    entries: BTreeMap<String, Registration>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in widget types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::register_builtins(&mut registry);
        registry
    }

    /// Register (or replace) a widget type under `identifier`.
    pub fn register(&mut self, identifier: impl Into<String>, widget: Arc<dyn WidgetType>) {
        let identifier = identifier.into();
        log::debug!(target: "widgets.registry", "register widget type `{identifier}`");
        self.entries.insert(identifier, Registration::Widget(widget));
    }

    pub fn register_placeholder(&mut self, identifier: impl Into<String>, name: impl Into<String>) {
        self.entries.insert(
            identifier.into(),
            Registration::Placeholder { name: name.into() },
        );
    }

    pub fn resolve(&self, identifier: &str) -> Result<Arc<dyn WidgetType>, RenderError> {
        match self.entries.get(identifier) {
            Some(Registration::Widget(widget)) => Ok(Arc::clone(widget)),
            Some(Registration::Placeholder { name }) => {
                log::debug!(target: "widgets.registry", "`{identifier}` resolves to non-widget `{name}`");
                Err(RenderError::NotAWidget(identifier.to_string()))
            }
            None => Err(RenderError::NotFound(identifier.to_string())),
        }
    }

    /// Widget types offered to pickers, sorted by identifier. Placeholders are skipped.
    pub fn available(&self) -> Vec<AvailableWidget> {
        self.entries
            .iter()
            .filter_map(|(identifier, entry)| match entry {
                Registration::Widget(widget) => Some(AvailableWidget {
                    identifier: identifier.clone(),
                    metadata: widget.metadata(),
                }),
                Registration::Placeholder { .. } => None,
            })
            .collect()
    }
}

impl std::fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("identifiers", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
