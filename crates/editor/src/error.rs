use bus::RequestFailure;
use core_types::SessionId;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("no widget form is mounted")]
    NotMounted,
    #[error("no form control named `{0}`")]
    UnknownField(String),
    #[error("`{field}` has no option `{value}`")]
    UnknownOption { field: String, value: String },
    #[error("not a valid widget")]
    InvalidWidget,
    #[error("session is disposed")]
    Disposed,
    #[error("no form to submit yet")]
    NotReady,
    #[error("no session {0}")]
    UnknownSession(SessionId),
    #[error("render command channel is closed")]
    ChannelClosed,
    #[error(transparent)]
    Request(#[from] RequestFailure),
}
