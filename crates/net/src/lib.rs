//! Transports that carry render requests from the editor to a widget renderer.

pub mod config;
pub mod retry;

mod error;
mod transport;

pub use crate::config::SyncConfig;
pub use crate::error::{ConfigError, TransportError};
pub use crate::retry::{RetryFailure, RetryPolicy};
pub use crate::transport::{HttpTransport, LocalTransport, RenderTransport};
