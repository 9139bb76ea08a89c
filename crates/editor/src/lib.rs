//! Client side of the legacy widget bridge.
//!
//! Mounts server-rendered widget forms, extracts instance changes from them, and keeps
//! the form, the owner's instance and the render round-trip consistent.

pub mod controls;
pub mod form_fields;
pub mod input_store;

mod error;
mod form_mount;
mod host;
mod lifecycle;
mod session;

pub use crate::error::SyncError;
pub use crate::form_fields::extract_changes;
pub use crate::form_mount::{FormContainer, FormMount};
pub use crate::host::SessionHost;
pub use crate::input_store::InputValueStore;
pub use crate::lifecycle::{FormEvent, FormLifecycleListener};
pub use crate::session::{
    CommandSink, InstanceOwner, LegacyWidgetSession, NOT_A_VALID_WIDGET, SessionState, SessionView, WidgetProps,
};
