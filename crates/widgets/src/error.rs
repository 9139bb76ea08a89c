use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no widget type registered as `{0}`")]
    NotFound(String),
    #[error("`{0}` is registered but is not a widget")]
    NotAWidget(String),
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("malformed request body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("missing widget identifier")]
    MissingIdentifier,
    #[error("invalid widget identifier `{0}`")]
    InvalidIdentifier(String),
}
