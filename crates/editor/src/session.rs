//! Update orchestration for one legacy widget placement.
//!
//! A session issues render requests over the bus, applies responses to its mounted form
//! and reports submitted instances to the owner of the widget's props. Only the most
//! recent render request counts: responses to anything older are dropped.

use crate::error::SyncError;
use crate::form_mount::{FormContainer, FormMount};
use crate::lifecycle::FormLifecycleListener;
use bus::{CoreCommand, CoreEvent};
use core_types::{InstanceHash, RequestId, SessionId, WidgetNumber};
use std::sync::mpsc::Sender;
use widgets::{FieldNames, RenderRequest, RenderResult, WidgetInstance};

/// Shown instead of a form when the session has no usable widget identifier.
pub const NOT_A_VALID_WIDGET: &str = "Not a valid widget.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    AwaitingInitialRender,
    Idle,
    Submitting,
    Disposed,
}

/// What the enclosing editor stores for a placement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WidgetProps {
    pub identifier: Option<String>,
    pub instance: WidgetInstance,
}

impl WidgetProps {
    pub fn new(identifier: impl Into<String>, instance: WidgetInstance) -> Self {
        Self {
            identifier: Some(identifier.into()),
            instance,
        }
    }
}

/// Receives instances adopted from submitted updates, e.g. to persist them.
pub trait InstanceOwner {
    fn instance_changed(&mut self, instance: &WidgetInstance);
}

impl<F: FnMut(&WidgetInstance)> InstanceOwner for F {
    fn instance_changed(&mut self, instance: &WidgetInstance) {
        self(instance)
    }
}

/// Where render commands go.
pub trait CommandSink {
    fn send_command(&self, command: CoreCommand) -> Result<(), SyncError>;
}

impl CommandSink for Sender<CoreCommand> {
    fn send_command(&self, command: CoreCommand) -> Result<(), SyncError> {
        self.send(command).map_err(|_| SyncError::ChannelClosed)
    }
}

#[derive(Debug)]
pub enum SessionView<'a> {
    InvalidWidget(&'static str),
    /// Waiting on the first render (or on a preview).
    Loading,
    Form(&'a FormContainer),
    Preview(&'a str),
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RenderKind {
    Read,
    Update,
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    request_id: RequestId,
    kind: RenderKind,
}

pub struct LegacyWidgetSession {
    id: SessionId,
    widget_number: WidgetNumber,
    props: WidgetProps,
    state: SessionState,
    form: FormMount,
    /// Hash of the instance last handed to the owner; its echo must not re-render.
    pending_echo: Option<InstanceHash>,
    next_request: RequestId,
    render_in_flight: Option<InFlight>,
    preview_in_flight: Option<RequestId>,
    preview_mode: bool,
    preview: Option<String>,
    last_result: Option<RenderResult>,
    last_error: Option<SyncError>,
    owner: Option<Box<dyn InstanceOwner>>,
}

impl LegacyWidgetSession {
    pub fn new(id: SessionId, props: WidgetProps) -> Self {
        Self {
            id,
            widget_number: WidgetNumber::for_session(id),
            props,
            state: SessionState::Uninitialized,
            form: FormMount::new(),
            pending_echo: None,
            next_request: 1,
            render_in_flight: None,
            preview_in_flight: None,
            preview_mode: false,
            preview: None,
            last_result: None,
            last_error: None,
            owner: None,
        }
    }

    pub fn set_owner(&mut self, owner: impl InstanceOwner + 'static) {
        self.owner = Some(Box::new(owner));
    }

    pub fn add_form_listener(&mut self, listener: impl FormLifecycleListener + 'static) {
        self.form.add_listener(listener);
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn widget_number(&self) -> WidgetNumber {
        self.widget_number
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn props(&self) -> &WidgetProps {
        &self.props
    }

    pub fn instance(&self) -> &WidgetInstance {
        &self.props.instance
    }

    /// Last applied render response.
    pub fn last_result(&self) -> Option<&RenderResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    pub fn pending_echo(&self) -> Option<InstanceHash> {
        self.pending_echo
    }

    /// Whether a render request is still unanswered.
    pub fn is_rendering(&self) -> bool {
        self.render_in_flight.is_some()
    }

    pub fn is_previewing(&self) -> bool {
        self.preview_in_flight.is_some()
    }

    pub fn form(&self) -> Option<&FormContainer> {
        self.form.container()
    }

    pub fn form_mut(&mut self) -> Option<&mut FormContainer> {
        self.form.container_mut()
    }

    fn identifier(&self) -> Option<&str> {
        self.props
            .identifier
            .as_deref()
            .map(str::trim)
            .filter(|s| widgets::is_valid_identifier(s))
    }

    fn next_request_id(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request += 1;
        id
    }

    fn ensure_live(&self) -> Result<(), SyncError> {
        if self.state == SessionState::Disposed {
            return Err(SyncError::Disposed);
        }
        Ok(())
    }

    fn send_render(
        &mut self,
        sink: &dyn CommandSink,
        changes: Option<WidgetInstance>,
    ) -> Result<RequestId, SyncError> {
        let identifier = self.identifier().ok_or(SyncError::InvalidWidget)?.to_string();
        let instance = self.props.instance.clone();
        let (request, kind) = match changes {
            Some(changes) => (
                RenderRequest::update(identifier, instance, changes, self.widget_number),
                RenderKind::Update,
            ),
            None => (
                RenderRequest::read(identifier, instance, self.widget_number),
                RenderKind::Read,
            ),
        };
        let request_id = self.next_request_id();
        sink.send_command(CoreCommand::Render {
            session_id: self.id,
            request_id,
            request,
        })?;
        if let Some(superseded) = self.render_in_flight.replace(InFlight { request_id, kind }) {
            log::debug!(
                target: "editor.session",
                "session {}: request {} supersedes {}",
                self.id,
                request_id,
                superseded.request_id
            );
        }
        Ok(request_id)
    }

    /// Issue the initial render. Without a valid identifier nothing is requested.
    pub fn mount(&mut self, sink: &dyn CommandSink) -> Result<(), SyncError> {
        self.ensure_live()?;
        if self.state != SessionState::Uninitialized {
            return Ok(());
        }
        if self.identifier().is_none() {
            log::debug!(target: "editor.session", "session {}: no valid widget, not rendering", self.id);
            return Ok(());
        }
        self.send_render(sink, None)?;
        self.state = SessionState::AwaitingInitialRender;
        Ok(())
    }

    /// Take new props from the owner.
    ///
    /// An instance equal to the one just reported back (the echo) is ignored; any other
    /// change re-renders from the new instance, discarding unsubmitted edits. Returns
    /// whether a render was requested.
    pub fn set_props(&mut self, props: WidgetProps, sink: &dyn CommandSink) -> Result<bool, SyncError> {
        self.ensure_live()?;
        if props.identifier != self.props.identifier {
            self.props = props;
            self.remount(sink)?;
            return Ok(self.render_in_flight.is_some());
        }

        let changed = props.instance != self.props.instance;
        let hash = props.instance.content_hash();
        self.props = props;

        // The marker matches at most the next change; anything else invalidates it.
        if self.pending_echo.take() == Some(hash) {
            log::trace!(target: "editor.session", "session {}: echo {hash} ignored", self.id);
            return Ok(false);
        }
        if !changed || self.state == SessionState::Uninitialized || self.identifier().is_none() {
            return Ok(false);
        }

        log::debug!(target: "editor.session", "session {}: external instance change, re-rendering", self.id);
        self.send_render(sink, None)?;
        if self.state == SessionState::Submitting {
            self.state = SessionState::Idle;
        }
        Ok(true)
    }

    /// Switch the placement to another widget type with an empty instance.
    pub fn set_identifier(&mut self, identifier: Option<String>, sink: &dyn CommandSink) -> Result<(), SyncError> {
        self.ensure_live()?;
        self.props = WidgetProps {
            identifier,
            instance: WidgetInstance::new(),
        };
        self.remount(sink)
    }

    fn remount(&mut self, sink: &dyn CommandSink) -> Result<(), SyncError> {
        self.form.unmount();
        self.state = SessionState::Uninitialized;
        self.pending_echo = None;
        self.render_in_flight = None;
        self.preview_in_flight = None;
        self.preview_mode = false;
        self.preview = None;
        self.last_result = None;
        self.last_error = None;
        self.mount(sink)
    }

    /// Send the form's current values as instance changes.
    ///
    /// A submission made while another is in flight supersedes it.
    pub fn submit_update(&mut self, sink: &dyn CommandSink) -> Result<RequestId, SyncError> {
        self.ensure_live()?;
        if self.identifier().is_none() {
            return Err(SyncError::InvalidWidget);
        }
        if !matches!(self.state, SessionState::Idle | SessionState::Submitting) {
            return Err(SyncError::NotReady);
        }
        let changes = self.form.extract_changes()?;
        self.pending_echo = None;
        let request_id = self.send_render(sink, Some(changes))?;
        self.state = SessionState::Submitting;
        Ok(request_id)
    }

    /// Submit only when the form differs from what was last observed.
    pub fn submit_if_changed(&mut self, sink: &dyn CommandSink) -> Result<Option<RequestId>, SyncError> {
        self.ensure_live()?;
        if !matches!(self.state, SessionState::Idle | SessionState::Submitting) {
            return Ok(None);
        }
        match self.form.take_instance_change() {
            Some(_) => self.submit_update(sink).map(Some),
            None => Ok(None),
        }
    }

    /// Fetch the front-end output of the current instance and show it.
    pub fn request_preview(&mut self, sink: &dyn CommandSink) -> Result<RequestId, SyncError> {
        self.ensure_live()?;
        let identifier = self.identifier().ok_or(SyncError::InvalidWidget)?.to_string();
        let request_id = self.next_request_id();
        sink.send_command(CoreCommand::Preview {
            session_id: self.id,
            request_id,
            identifier,
            instance: self.props.instance.clone(),
            id_to_use: self.widget_number,
        })?;
        self.preview_in_flight = Some(request_id);
        self.preview_mode = true;
        self.preview = None;
        Ok(request_id)
    }

    /// Leave the preview and show the form again.
    pub fn show_form(&mut self) {
        self.preview_mode = false;
    }

    /// Apply a response. Returns whether it changed anything.
    pub fn handle_event(&mut self, event: CoreEvent) -> bool {
        if event.session_id() != self.id {
            return false;
        }
        if self.state == SessionState::Disposed {
            log::debug!(
                target: "editor.session",
                "session {}: dropping response {} after dispose",
                self.id,
                event.request_id()
            );
            return false;
        }

        match event {
            CoreEvent::Rendered { request_id, result, .. } => {
                let Some(flight) = self.take_render(request_id) else {
                    return false;
                };
                self.apply_render(flight.kind, result);
                true
            }
            CoreEvent::PreviewReady { request_id, markup, .. } => {
                if self.preview_in_flight != Some(request_id) {
                    log::trace!(target: "editor.session", "session {}: stale preview {request_id}", self.id);
                    return false;
                }
                self.preview_in_flight = None;
                self.preview = Some(markup);
                true
            }
            CoreEvent::RequestFailed { request_id, failure, .. } => {
                if self.preview_in_flight == Some(request_id) {
                    log::warn!(target: "editor.session", "session {}: preview failed: {failure}", self.id);
                    self.preview_in_flight = None;
                    self.last_error = Some(failure.into());
                    return true;
                }
                let Some(flight) = self.take_render(request_id) else {
                    return false;
                };
                log::warn!(target: "editor.session", "session {}: render failed: {failure}", self.id);
                self.last_error = Some(failure.into());
                if flight.kind == RenderKind::Update || self.state == SessionState::Submitting {
                    self.state = SessionState::Idle;
                }
                true
            }
        }
    }

    fn take_render(&mut self, request_id: RequestId) -> Option<InFlight> {
        match self.render_in_flight {
            Some(flight) if flight.request_id == request_id => self.render_in_flight.take(),
            _ => {
                log::debug!(
                    target: "editor.session",
                    "session {}: dropping stale response {request_id}",
                    self.id
                );
                None
            }
        }
    }

    fn apply_render(&mut self, kind: RenderKind, result: RenderResult) {
        if kind == RenderKind::Update {
            self.pending_echo = Some(result.instance.content_hash());
            self.props.instance = result.instance.clone();
            if let Some(owner) = self.owner.as_mut() {
                owner.instance_changed(&result.instance);
            }
        }

        let same_widget = self
            .form
            .container()
            .is_some_and(|c| c.id_base() == result.id_base);
        if same_widget {
            if let Err(err) = self.form.apply_form(&result.form) {
                log::warn!(target: "editor.session", "session {}: patch failed: {err}", self.id);
            }
        } else {
            self.form.mount(
                FieldNames::new(result.id_base.clone(), self.widget_number),
                &result.id.to_string(),
                &result.form,
            );
        }

        self.state = SessionState::Idle;
        self.last_error = None;
        self.last_result = Some(result);
    }

    /// Tear down. Late responses are ignored and the runtime drops outstanding work.
    pub fn dispose(&mut self, sink: &dyn CommandSink) -> Result<(), SyncError> {
        if self.state == SessionState::Disposed {
            return Ok(());
        }
        self.state = SessionState::Disposed;
        self.form.unmount();
        self.render_in_flight = None;
        self.preview_in_flight = None;
        self.pending_echo = None;
        log::debug!(target: "editor.session", "session {} disposed", self.id);
        sink.send_command(CoreCommand::CancelSession { session_id: self.id })
    }

    pub fn view(&self) -> SessionView<'_> {
        if self.state == SessionState::Disposed {
            return SessionView::Disposed;
        }
        if self.identifier().is_none() {
            return SessionView::InvalidWidget(NOT_A_VALID_WIDGET);
        }
        if self.preview_mode {
            return match &self.preview {
                Some(markup) => SessionView::Preview(markup),
                None => SessionView::Loading,
            };
        }
        match self.form.container() {
            Some(container) => SessionView::Form(container),
            None => SessionView::Loading,
        }
    }
}
