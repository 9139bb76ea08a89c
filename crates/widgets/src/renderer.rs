use crate::error::RenderError;
use crate::form::{FieldNames, FormBuffer};
use crate::instance::WidgetInstance;
use crate::registry::WidgetRegistry;
use core_types::WidgetNumber;
use serde::{Deserialize, Serialize};

/// A render (and optional update) request for one widget placement.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    pub identifier: String,
    pub instance: WidgetInstance,
    /// When present, the widget type's `update` runs first and its result is rendered.
    pub instance_changes: Option<WidgetInstance>,
    pub id_to_use: WidgetNumber,
}

impl RenderRequest {
    /// Read-only render of `instance`.
    pub fn read(identifier: impl Into<String>, instance: WidgetInstance, id_to_use: WidgetNumber) -> Self {
        Self {
            identifier: identifier.into(),
            instance,
            instance_changes: None,
            id_to_use,
        }
    }

    /// Render after applying `changes` on top of `instance`.
    pub fn update(
        identifier: impl Into<String>,
        instance: WidgetInstance,
        changes: WidgetInstance,
        id_to_use: WidgetNumber,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            instance,
            instance_changes: Some(changes),
            id_to_use,
        }
    }

    pub fn is_update(&self) -> bool {
        self.instance_changes.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetId::Number(n) => write!(f, "{n}"),
            WidgetId::Text(s) => f.write_str(s),
        }
    }
}

/// Output of one render. Superseded wholesale by the next one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub instance: WidgetInstance,
    pub form: String,
    pub id_base: String,
    pub id: WidgetId,
}

/// Render the admin form for a widget placement.
///
/// With `instance_changes`, the widget type's update is applied first and the updated
/// instance is both rendered and returned.
pub fn render(registry: &WidgetRegistry, request: &RenderRequest) -> Result<RenderResult, RenderError> {
    let widget = registry.resolve(&request.identifier)?;

    let instance = match &request.instance_changes {
        Some(changes) => widget.update(changes, &request.instance),
        None => request.instance.clone(),
    };

    let names = FieldNames::new(widget.id_base(), request.id_to_use);
    let mut buffer = FormBuffer::new(&names);
    widget.form(&instance, &mut buffer);
    let form = buffer.into_markup();

    log::debug!(
        target: "widgets.render",
        "rendered `{}` #{} ({} bytes, update={})",
        request.identifier,
        request.id_to_use,
        form.len(),
        request.is_update()
    );

    Ok(RenderResult {
        instance,
        form,
        id_base: widget.id_base().to_string(),
        id: WidgetId::Text(names.widget_id()),
    })
}

/// Render the front-end output of a widget placement.
pub fn preview(
    registry: &WidgetRegistry,
    identifier: &str,
    instance: &WidgetInstance,
    id_to_use: WidgetNumber,
) -> Result<String, RenderError> {
    let widget = registry.resolve(identifier)?;
    let names = FieldNames::new(widget.id_base(), id_to_use);
    let mut buffer = FormBuffer::new(&names);
    buffer.raw(&format!(
        r#"<div class="widget widget_{}">"#,
        html::attr_escaped(widget.id_base())
    ));
    widget.display(instance, &mut buffer);
    buffer.raw("</div>");
    Ok(buffer.into_markup())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{WidgetMetadata, WidgetType};
    use std::sync::Arc;

    struct Doubler;

    impl WidgetType for Doubler {
        fn id_base(&self) -> &str {
            "doubler"
        }

        fn metadata(&self) -> WidgetMetadata {
            WidgetMetadata {
                name: "Doubler".into(),
                ..WidgetMetadata::default()
            }
        }

        fn form(&self, instance: &WidgetInstance, out: &mut FormBuffer<'_>) {
            out.text_input("Word", "word", instance.get_str("word").unwrap_or(""));
        }

        fn update(&self, changes: &WidgetInstance, _previous: &WidgetInstance) -> WidgetInstance {
            let word = changes.get_str("word").unwrap_or("");
            [("word", word.repeat(2))].into_iter().collect()
        }
    }

    fn registry() -> WidgetRegistry {
        let mut registry = WidgetRegistry::new();
        registry.register("doubler", Arc::new(Doubler));
        registry
    }

    #[test]
    fn update_result_is_authoritative() {
        let changes: WidgetInstance = [("word", "ab")].into_iter().collect();
        let request = RenderRequest::update("doubler", WidgetInstance::new(), changes.clone(), WidgetNumber::DEFAULT);
        let result = render(&registry(), &request).unwrap();

        assert_eq!(result.instance, Doubler.update(&changes, &WidgetInstance::new()));
        assert!(result.form.contains(r#"value="abab""#), "{}", result.form);
    }

    #[test]
    fn read_render_keeps_instance() {
        let instance: WidgetInstance = [("word", "x")].into_iter().collect();
        let request = RenderRequest::read("doubler", instance.clone(), WidgetNumber::from_raw(-7));
        let result = render(&registry(), &request).unwrap();

        assert_eq!(result.instance, instance);
        assert_eq!(result.id_base, "doubler");
        assert_eq!(result.id, WidgetId::Text("doubler--7".into()));
        assert!(result.form.contains("widget-doubler[-7][word]"));
    }

    #[test]
    fn widget_id_accepts_numbers_and_strings_on_the_wire() {
        let number: WidgetId = serde_json::from_str("-2").unwrap();
        let text: WidgetId = serde_json::from_str(r#""search-2""#).unwrap();
        assert_eq!(number, WidgetId::Number(-2));
        assert_eq!(text.to_string(), "search-2");
    }

    #[test]
    fn unknown_identifier_fails() {
        let request = RenderRequest::read("nope", WidgetInstance::new(), WidgetNumber::DEFAULT);
        assert_eq!(render(&registry(), &request), Err(RenderError::NotFound("nope".into())));
    }

    #[test]
    fn preview_wraps_display_output() {
        let instance: WidgetInstance = [("title", "Hi")].into_iter().collect();
        let out = preview(&registry(), "doubler", &instance, WidgetNumber::DEFAULT).unwrap();
        assert_eq!(
            out,
            r#"<div class="widget widget_doubler"><h2 class="widgettitle">Hi</h2></div>"#
        );
    }
}
