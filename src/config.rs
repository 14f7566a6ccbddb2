//! Client configuration
//!
//! `ClientConfig` is plain data (camelCase JSON) so it can live in a
//! service's config file. Every field has a default.

use crate::error::{PublishError, Result};
use crate::retry::RetryConfig;
use crate::uri::parse_base;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a `NakadiClient`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Broker base address (e.g. `https://nakadi.example.com`)
    pub base_url: String,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Scope presented when publishing; the event stream write scope if unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Default retry policy; sends are attempted once if unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    /// `User-Agent` header
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            scope: None,
            retry: None,
            user_agent: concat!("a3s-nakadi/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Default config pointed at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PublishError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PublishError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), base_url = %config.base_url, "Client config loaded");
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        parse_base(&self.base_url)
            .map_err(|e| PublishError::Config(format!("baseUrl: {}", e)))?;

        if self.request_timeout_secs == 0 {
            return Err(PublishError::Config(
                "requestTimeoutSecs must be greater than zero".to_string(),
            ));
        }

        if let Some(scope) = &self.scope {
            if scope.trim().is_empty() {
                return Err(PublishError::Config("scope must not be blank".to_string()));
            }
        }

        Ok(())
    }
}
