//! Per-request resource options and per-call publish options

use crate::auth::{SecretString, TokenProvider};
use crate::retry::RetryPolicy;
use std::sync::Arc;

/// Content type of every publish request
pub const APPLICATION_JSON: &str = "application/json";

/// Options carried by a single resource call
///
/// Built fresh for every request and never mutated once handed to a
/// transport.
#[derive(Clone)]
pub struct ResourceOptions {
    content_type: String,
    scope: String,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl ResourceOptions {
    pub fn new(content_type: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            scope: scope.into(),
            token_provider: None,
        }
    }

    pub fn token_provider(mut self, provider: Option<Arc<dyn TokenProvider>>) -> Self {
        self.token_provider = provider;
        self
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// `Authorization` header value for this request's scope
    pub fn authorization(&self) -> Option<SecretString> {
        self.token_provider
            .as_ref()
            .and_then(|provider| provider.authorization(&self.scope))
    }
}

impl std::fmt::Debug for ResourceOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceOptions")
            .field("content_type", &self.content_type)
            .field("scope", &self.scope)
            .field("token_provider", &self.token_provider.is_some())
            .finish()
    }
}

/// Overrides for a single publish call
///
/// Unset fields fall back to the publisher's, then the client's, defaults.
#[derive(Clone, Default)]
pub struct PublishOptions {
    /// Authorization scope to present instead of the default write scope
    pub scope: Option<String>,

    /// Retry policy to wrap this call in
    pub retry_policy: Option<Arc<dyn RetryPolicy>>,
}

impl PublishOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }
}

impl std::fmt::Debug for PublishOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishOptions")
            .field("scope", &self.scope)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}
