use crate::error::TransportError;
use core_types::WidgetNumber;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use widgets::endpoint::{RenderRequestBody, handle_render_json};
use widgets::{RenderRequest, RenderResult, WidgetInstance, WidgetRegistry, is_valid_identifier};

/// Carries render requests to a widget renderer.
///
/// `Ok(None)` is the empty response: the identifier did not resolve to a widget.
pub trait RenderTransport: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<Option<RenderResult>, TransportError>;

    fn preview(
        &self,
        identifier: &str,
        instance: &WidgetInstance,
        id_to_use: WidgetNumber,
    ) -> Result<Option<String>, TransportError>;
}

fn decode_render_body(body: &str) -> Result<Option<RenderResult>, TransportError> {
    let body = body.trim();
    if body.is_empty() || body == "null" {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| TransportError::Decode(e.to_string()))
}

/// In-process transport that still goes through the JSON wire contract.
#[derive(Clone, Debug)]
pub struct LocalTransport {
    registry: Arc<WidgetRegistry>,
}

impl LocalTransport {
    pub fn new(registry: Arc<WidgetRegistry>) -> Self {
        Self { registry }
    }
}

impl RenderTransport for LocalTransport {
    fn render(&self, request: &RenderRequest) -> Result<Option<RenderResult>, TransportError> {
        let body = serde_json::to_string(&RenderRequestBody::from_request(request))
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        let response = handle_render_json(&self.registry, Some(&request.identifier), &body)
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        decode_render_body(&response)
    }

    fn preview(
        &self,
        identifier: &str,
        instance: &WidgetInstance,
        id_to_use: WidgetNumber,
    ) -> Result<Option<String>, TransportError> {
        match widgets::preview(&self.registry, identifier, instance, id_to_use) {
            Ok(markup) => Ok(Some(markup)),
            Err(err) => {
                log::warn!(target: "net", "empty preview response: {err}");
                Ok(None)
            }
        }
    }
}

#[derive(Deserialize)]
struct PreviewBody {
    rendered: String,
}

/// HTTP transport posting to `{base}/widgets/{identifier}/`.
pub struct HttpTransport {
    base: Url,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut base = Url::parse(endpoint).map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent("widgetsync/0.1")
            .build();
        Ok(Self { base, agent })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `base` plus `segments`, each percent-encoded as a single path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidEndpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn read(response: Result<ureq::Response, ureq::Error>) -> Result<Option<String>, TransportError> {
        match response {
            Ok(resp) => resp
                .into_string()
                .map(Some)
                .map_err(|e| TransportError::Network(e.to_string())),
            // The endpoint answers unknown identifiers with 404: an empty response.
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(code, _)) => Err(TransportError::Status(code)),
            Err(ureq::Error::Transport(t)) => Err(TransportError::Network(t.to_string())),
        }
    }
}

impl RenderTransport for HttpTransport {
    fn render(&self, request: &RenderRequest) -> Result<Option<RenderResult>, TransportError> {
        if !is_valid_identifier(&request.identifier) {
            return Err(TransportError::Rejected(format!(
                "invalid widget identifier `{}`",
                request.identifier
            )));
        }
        let url = self.url(&["widgets", &request.identifier, ""])?;
        let body = serde_json::to_string(&RenderRequestBody::from_request(request))
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        log::debug!(target: "net", "POST {url}");
        let response = self
            .agent
            .post(url.as_str())
            .set("Content-Type", "application/json")
            .send_string(&body);
        match Self::read(response)? {
            Some(body) => decode_render_body(&body),
            None => Ok(None),
        }
    }

    fn preview(
        &self,
        identifier: &str,
        instance: &WidgetInstance,
        id_to_use: WidgetNumber,
    ) -> Result<Option<String>, TransportError> {
        let url = self.url(&["block-renderer", "legacy-widget"])?;
        let instance = serde_json::to_string(instance).map_err(|e| TransportError::Encode(e.to_string()))?;
        let id = id_to_use.as_raw().to_string();
        let response = self
            .agent
            .get(url.as_str())
            .query("identifier", identifier)
            .query("instance", &instance)
            .query("id_to_use", &id)
            .call();
        match Self::read(response)? {
            Some(body) if !body.trim().is_empty() => serde_json::from_str::<PreviewBody>(&body)
                .map(|b| Some(b.rendered))
                .map_err(|e| TransportError::Decode(e.to_string())),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use widgets::WidgetId;

    #[test]
    fn local_transport_round_trips_through_the_wire_format() {
        let transport = LocalTransport::new(Arc::new(WidgetRegistry::with_builtins()));
        let changes: WidgetInstance = [("title", "Find stuff")].into_iter().collect();
        let request = RenderRequest::update("search", WidgetInstance::new(), changes.clone(), WidgetNumber::from_raw(-9));

        let result = transport.render(&request).unwrap().unwrap();
        assert_eq!(result.instance, changes);
        assert_eq!(result.id, WidgetId::Text("search--9".into()));
    }

    #[test]
    fn local_transport_maps_unknown_widgets_to_empty_responses() {
        let transport = LocalTransport::new(Arc::new(WidgetRegistry::with_builtins()));
        let request = RenderRequest::read("unknown_widget", WidgetInstance::new(), WidgetNumber::DEFAULT);
        assert!(transport.render(&request).unwrap().is_none());
        assert!(transport
            .preview("unknown_widget", &WidgetInstance::new(), WidgetNumber::DEFAULT)
            .unwrap()
            .is_none());
    }

    #[test]
    fn http_transport_normalizes_base_path() {
        let transport = HttpTransport::new("http://localhost:8080/api", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base().as_str(), "http://localhost:8080/api/");
        assert_eq!(
            transport.url(&["widgets", "search", ""]).unwrap().as_str(),
            "http://localhost:8080/api/widgets/search/"
        );
        assert!(matches!(
            HttpTransport::new("not a url", Duration::from_secs(1)),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn identifiers_stay_inside_the_widgets_route() {
        let transport = HttpTransport::new("http://localhost:8080/wp-json/", Duration::from_secs(1)).unwrap();
        let url = transport.url(&["widgets", "../../../wp/v2/users?x=", ""]).unwrap();
        assert!(url.path().starts_with("/wp-json/widgets/"), "{url}");
        assert_eq!(url.query(), None);

        let request = RenderRequest::read("../../../wp/v2/users?x=", WidgetInstance::new(), WidgetNumber::DEFAULT);
        assert!(matches!(transport.render(&request), Err(TransportError::Rejected(_))));
    }

    #[test]
    fn empty_bodies_decode_to_no_result() {
        assert_eq!(decode_render_body("  ").unwrap(), None);
        assert_eq!(decode_render_body("null").unwrap(), None);
        assert!(matches!(decode_render_body("{"), Err(TransportError::Decode(_))));
    }
}
