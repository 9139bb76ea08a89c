//! Server side of the legacy widget bridge: widget types, their registry, and the
//! form renderer behind the render endpoint.

pub mod builtin;
pub mod endpoint;
pub mod form;

mod error;
mod instance;
mod registry;
mod renderer;

pub use crate::error::{EndpointError, RenderError};
pub use crate::form::{FieldNames, FormBuffer};
pub use crate::instance::WidgetInstance;
pub use crate::registry::{AvailableWidget, WidgetMetadata, WidgetRegistry, WidgetType, is_valid_identifier};
pub use crate::renderer::{RenderRequest, RenderResult, WidgetId, preview, render};

/// Field names that only exist to satisfy widget scripts expecting the legacy form shape.
///
/// They never belong in an instance.
pub const BOOKKEEPING_FIELDS: &[&str] = &[
    "widget-id",
    "id_base",
    "widget-width",
    "widget-height",
    "widget_number",
    "multi_number",
    "add_new",
];
