use crate::error::SyncError;
use crate::session::{CommandSink, LegacyWidgetSession, WidgetProps};
use bus::CoreEvent;
use core_types::{RequestId, SessionId};
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Owns the sessions of one editor and routes bus events to them.
pub struct SessionHost<S: CommandSink> {
    sink: S,
    sessions: HashMap<SessionId, LegacyWidgetSession>,
    next_session: SessionId,
}

impl<S: CommandSink> SessionHost<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            sessions: HashMap::new(),
            next_session: 1,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Open and mount a session.
    pub fn open(&mut self, props: WidgetProps) -> Result<SessionId, SyncError> {
        self.open_with(props, |_| {})
    }

    /// Open a session, letting `configure` attach owners and listeners before it mounts.
    pub fn open_with(
        &mut self,
        props: WidgetProps,
        configure: impl FnOnce(&mut LegacyWidgetSession),
    ) -> Result<SessionId, SyncError> {
        let id = self.next_session;
        self.next_session += 1;
        let mut session = LegacyWidgetSession::new(id, props);
        configure(&mut session);
        session.mount(&self.sink)?;
        log::debug!(target: "editor.host", "opened session {id} (#{})", session.widget_number());
        self.sessions.insert(id, session);
        Ok(id)
    }

    pub fn get(&self, id: SessionId) -> Option<&LegacyWidgetSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut LegacyWidgetSession> {
        self.sessions.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut LegacyWidgetSession, SyncError> {
        self.sessions.get_mut(&id).ok_or(SyncError::UnknownSession(id))
    }

    pub fn set_props(&mut self, id: SessionId, props: WidgetProps) -> Result<bool, SyncError> {
        let session = self.sessions.get_mut(&id).ok_or(SyncError::UnknownSession(id))?;
        session.set_props(props, &self.sink)
    }

    pub fn set_identifier(&mut self, id: SessionId, identifier: Option<String>) -> Result<(), SyncError> {
        let session = self.sessions.get_mut(&id).ok_or(SyncError::UnknownSession(id))?;
        session.set_identifier(identifier, &self.sink)
    }

    pub fn submit_update(&mut self, id: SessionId) -> Result<RequestId, SyncError> {
        let session = self.sessions.get_mut(&id).ok_or(SyncError::UnknownSession(id))?;
        session.submit_update(&self.sink)
    }

    pub fn request_preview(&mut self, id: SessionId) -> Result<RequestId, SyncError> {
        let session = self.sessions.get_mut(&id).ok_or(SyncError::UnknownSession(id))?;
        session.request_preview(&self.sink)
    }

    /// Dispose and forget a session.
    pub fn close(&mut self, id: SessionId) -> Result<(), SyncError> {
        let mut session = self.sessions.remove(&id).ok_or(SyncError::UnknownSession(id))?;
        session.dispose(&self.sink)
    }

    /// Route one event. Events for closed sessions are dropped.
    pub fn dispatch(&mut self, event: CoreEvent) -> bool {
        let id = event.session_id();
        match self.session_mut(id) {
            Ok(session) => session.handle_event(event),
            Err(_) => {
                log::debug!(target: "editor.host", "event for closed session {id} dropped");
                false
            }
        }
    }

    /// Apply every event already waiting, without blocking. Returns how many applied.
    pub fn pump(&mut self, events: &Receiver<CoreEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            if self.dispatch(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Block up to `timeout` for one event and route it.
    ///
    /// `None` on timeout or when the runtime is gone.
    pub fn pump_one(&mut self, events: &Receiver<CoreEvent>, timeout: Duration) -> Option<bool> {
        match events.recv_timeout(timeout) {
            Ok(event) => Some(self.dispatch(event)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!(target: "editor.host", "event channel disconnected");
                None
            }
        }
    }
}
