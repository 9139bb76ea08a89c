//! Wire contract of `POST /widgets/{identifier}/`.
//!
//! Request body: `{ identifier, instance, id_to_use, instance_changes }`.
//! Response body: `{ instance, form, id_base, id }`, or nothing when the identifier
//! does not resolve to a widget.

use crate::error::EndpointError;
use crate::instance::WidgetInstance;
use crate::registry::{WidgetRegistry, is_valid_identifier};
use crate::renderer::{RenderRequest, RenderResult, render};
use core_types::WidgetNumber;
use serde::{Deserialize, Serialize};

fn default_id_to_use() -> i64 {
    WidgetNumber::DEFAULT.as_raw()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub instance: WidgetInstance,
    #[serde(default = "default_id_to_use")]
    pub id_to_use: i64,
    #[serde(default)]
    pub instance_changes: Option<WidgetInstance>,
}

impl RenderRequestBody {
    pub fn from_request(request: &RenderRequest) -> Self {
        Self {
            identifier: Some(request.identifier.clone()),
            instance: request.instance.clone(),
            id_to_use: request.id_to_use.as_raw(),
            instance_changes: request.instance_changes.clone(),
        }
    }

    /// Resolve into a render request; the path identifier wins over the body's.
    pub fn into_request(self, path_identifier: Option<&str>) -> Result<RenderRequest, EndpointError> {
        let identifier = path_identifier
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or(self.identifier)
            .filter(|id| !id.is_empty())
            .ok_or(EndpointError::MissingIdentifier)?;
        if !is_valid_identifier(&identifier) {
            return Err(EndpointError::InvalidIdentifier(identifier));
        }
        Ok(RenderRequest {
            identifier,
            instance: self.instance,
            instance_changes: self.instance_changes,
            id_to_use: WidgetNumber::from_raw(self.id_to_use),
        })
    }
}

/// Handle one render request body.
///
/// Unknown or non-widget identifiers yield `Ok(None)`: an empty response, logged but
/// not surfaced as an error.
pub fn handle_render(
    registry: &WidgetRegistry,
    path_identifier: Option<&str>,
    body: &str,
) -> Result<Option<RenderResult>, EndpointError> {
    let body: RenderRequestBody = if body.trim().is_empty() {
        serde_json::from_str("{}")?
    } else {
        serde_json::from_str(body)?
    };
    let request = body.into_request(path_identifier)?;
    match render(registry, &request) {
        Ok(result) => Ok(Some(result)),
        Err(err) => {
            log::warn!(target: "widgets.endpoint", "empty render response: {err}");
            Ok(None)
        }
    }
}

/// Same as [`handle_render`] but produces the serialized response body.
pub fn handle_render_json(
    registry: &WidgetRegistry,
    path_identifier: Option<&str>,
    body: &str,
) -> Result<String, EndpointError> {
    let response = handle_render(registry, path_identifier, body)?;
    Ok(match response {
        Some(result) => serde_json::to_string(&result)?,
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::WidgetId;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_fields() {
        let body: RenderRequestBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.id_to_use, -1);
        assert!(body.instance.is_empty());
        assert!(body.instance_changes.is_none());
    }

    #[test]
    fn null_changes_mean_read_only_render() {
        let registry = WidgetRegistry::with_builtins();
        let body = json!({ "instance": { "title": "T" }, "instance_changes": null }).to_string();
        let result = handle_render(&registry, Some("search"), &body).unwrap().unwrap();
        assert_eq!(result.instance.get_str("title"), Some("T"));
        assert_eq!(result.id, WidgetId::Text("search--1".into()));
    }

    #[test]
    fn unknown_identifier_is_an_empty_response() {
        let registry = WidgetRegistry::with_builtins();
        assert_eq!(handle_render(&registry, Some("unknown_widget"), "{}").unwrap(), None);
        assert_eq!(handle_render_json(&registry, Some("unknown_widget"), "").unwrap(), "");
    }

    #[test]
    fn missing_identifier_and_bad_json_are_errors() {
        let registry = WidgetRegistry::with_builtins();
        assert!(matches!(
            handle_render(&registry, None, "{}"),
            Err(EndpointError::MissingIdentifier)
        ));
        assert!(matches!(
            handle_render(&registry, Some("search"), "{not json"),
            Err(EndpointError::Body(_))
        ));
    }

    #[test]
    fn identifiers_outside_the_route_grammar_are_rejected() {
        let registry = WidgetRegistry::with_builtins();
        assert!(matches!(
            handle_render(&registry, Some("../../../wp/v2/users?x="), "{}"),
            Err(EndpointError::InvalidIdentifier(_))
        ));
        let body = json!({ "identifier": "tag-cloud" }).to_string();
        assert!(matches!(
            handle_render(&registry, None, &body),
            Err(EndpointError::InvalidIdentifier(id)) if id == "tag-cloud"
        ));
    }

    #[test]
    fn response_uses_wire_field_names() {
        let registry = WidgetRegistry::with_builtins();
        let body = json!({ "id_to_use": -3, "instance_changes": { "title": "Hi" } }).to_string();
        let out: serde_json::Value =
            serde_json::from_str(&handle_render_json(&registry, Some("search"), &body).unwrap()).unwrap();
        assert_eq!(out["id_base"], "search");
        assert_eq!(out["id"], "search--3");
        assert_eq!(out["instance"], json!({ "title": "Hi" }));
        assert!(out["form"].as_str().unwrap().contains("widget-search[-3][title]"));
    }
}
