//! Transport configuration.
//!
//! ```toml
//! endpoint = "http://localhost:8080/wp-json/"   # omit to render in-process
//! timeout_ms = 10000
//!
//! [retry]
//! max_attempts = 3
//! initial_backoff_ms = 200
//! max_backoff_ms = 2000
//! ```

use crate::error::{ConfigError, TransportError};
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, LocalTransport, RenderTransport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use widgets::WidgetRegistry;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Base URL of the render endpoint. `None` renders with the local registry.
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 10_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint).map_err(|e| ConfigError::Endpoint {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// HTTP transport when an endpoint is configured, otherwise in-process rendering
    /// against `registry`.
    pub fn build_transport(
        &self,
        registry: Arc<WidgetRegistry>,
    ) -> Result<Arc<dyn RenderTransport>, TransportError> {
        Ok(match &self.endpoint {
            Some(endpoint) => Arc::new(HttpTransport::new(endpoint, self.timeout())?),
            None => Arc::new(LocalTransport::new(registry)),
        })
    }
}
