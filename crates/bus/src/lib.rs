use core_types::{RequestId, SessionId, WidgetNumber};
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;
use widgets::{RenderRequest, RenderResult, WidgetInstance};

#[derive(Debug)]
pub enum CoreCommand {
    // Editor -> renderer
    Render {
        session_id: SessionId,
        request_id: RequestId,
        request: RenderRequest,
    },
    Preview {
        session_id: SessionId,
        request_id: RequestId,
        identifier: String,
        instance: WidgetInstance,
        id_to_use: WidgetNumber,
    },
    // Session disposed: drop anything still outstanding for it.
    CancelSession {
        session_id: SessionId,
    },
}

#[derive(Debug)]
pub enum CoreEvent {
    // Renderer -> editor
    Rendered {
        session_id: SessionId,
        request_id: RequestId,
        result: RenderResult,
    },
    PreviewReady {
        session_id: SessionId,
        request_id: RequestId,
        markup: String,
    },
    RequestFailed {
        session_id: SessionId,
        request_id: RequestId,
        failure: RequestFailure,
    },
}

impl CoreEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            CoreEvent::Rendered { session_id, .. }
            | CoreEvent::PreviewReady { session_id, .. }
            | CoreEvent::RequestFailed { session_id, .. } => *session_id,
        }
    }

    pub fn request_id(&self) -> RequestId {
        match self {
            CoreEvent::Rendered { request_id, .. }
            | CoreEvent::PreviewReady { request_id, .. }
            | CoreEvent::RequestFailed { request_id, .. } => *request_id,
        }
    }
}

/// Why a request produced no usable response.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RequestFailure {
    /// The identifier does not resolve to a widget (empty response).
    #[error("no widget `{0}`")]
    NoWidget(String),
    /// Transport kept failing after retries.
    #[error("transport failure after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },
    #[error("malformed response: {0}")]
    BadResponse(String),
}

pub struct Bus {
    pub cmd_tx: Sender<CoreCommand>,
    pub evt_rx: Receiver<CoreEvent>,
    pub evt_tx: Sender<CoreEvent>, // shareable for runtimes
}

impl Bus {
    /// Create a bus plus the command receiver a runtime consumes.
    pub fn new() -> (Bus, Receiver<CoreCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        (
            Bus {
                cmd_tx,
                evt_rx,
                evt_tx,
            },
            cmd_rx,
        )
    }
}
