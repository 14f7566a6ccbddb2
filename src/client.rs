//! Long-lived client handle
//!
//! `NakadiClient` owns the collaborators every publish call shares: the
//! transport, the metric collector, the token provider, and the immutable
//! defaults for scope and retry. It is cheap to clone and safe to share
//! across tasks.

use crate::auth::TokenProvider;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::metrics::{MetricCollector, NoopMetricCollector};
use crate::publisher::EventPublisher;
use crate::retry::RetryPolicy;
use crate::transport::http::HttpResource;
use crate::transport::Resource;
use crate::uri::parse_base;
use reqwest::Url;
use std::sync::Arc;

struct ClientInner {
    base_url: Url,
    resource: Arc<dyn Resource>,
    metrics: Arc<dyn MetricCollector>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    scope: Option<String>,
}

/// Client for a Nakadi-style event broker
#[derive(Clone)]
pub struct NakadiClient {
    inner: Arc<ClientInner>,
}

impl NakadiClient {
    pub fn builder() -> NakadiClientBuilder {
        NakadiClientBuilder::default()
    }

    /// Build a client with the HTTP transport from configuration
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Publisher for submitting events
    pub fn events(&self) -> EventPublisher {
        EventPublisher::new(self.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn resource(&self) -> &dyn Resource {
        self.inner.resource.as_ref()
    }

    pub fn metrics(&self) -> &dyn MetricCollector {
        self.inner.metrics.as_ref()
    }

    pub fn token_provider(&self) -> Option<Arc<dyn TokenProvider>> {
        self.inner.token_provider.clone()
    }

    /// Default retry policy, if one was configured
    pub fn retry_policy(&self) -> Option<&dyn RetryPolicy> {
        self.inner.retry_policy.as_deref()
    }

    /// Default scope, if one was configured
    pub fn scope(&self) -> Option<&str> {
        self.inner.scope.as_deref()
    }
}

impl std::fmt::Debug for NakadiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NakadiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("resource", &self.inner.resource.name())
            .field("scope", &self.inner.scope)
            .field("retry_policy", &self.inner.retry_policy)
            .finish()
    }
}

/// Builder for `NakadiClient`
#[derive(Default)]
pub struct NakadiClientBuilder {
    config: ClientConfig,
    resource: Option<Arc<dyn Resource>>,
    metrics: Option<Arc<dyn MetricCollector>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
}

impl NakadiClientBuilder {
    /// Replace the whole configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Default scope for every publish
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.config.scope = Some(scope.into());
        self
    }

    /// Transport to use instead of the HTTP one
    pub fn resource<R: Resource + 'static>(mut self, resource: Arc<R>) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn metrics<M: MetricCollector + 'static>(mut self, metrics: Arc<M>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn token_provider<T: TokenProvider + 'static>(mut self, provider: Arc<T>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Default retry policy; takes precedence over `ClientConfig.retry`
    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<NakadiClient> {
        self.config.validate()?;
        let base_url = parse_base(&self.config.base_url)?;

        let resource: Arc<dyn Resource> = match self.resource {
            Some(resource) => resource,
            None => Arc::new(HttpResource::from_config(&self.config)?),
        };

        let retry_policy = self.retry_policy.or_else(|| {
            self.config
                .retry
                .clone()
                .map(|retry| Arc::new(retry) as Arc<dyn RetryPolicy>)
        });

        tracing::info!(
            base_url = %base_url,
            transport = resource.name(),
            retry = retry_policy.is_some(),
            "Nakadi client ready"
        );

        Ok(NakadiClient {
            inner: Arc::new(ClientInner {
                base_url,
                resource,
                metrics: self
                    .metrics
                    .unwrap_or_else(|| Arc::new(NoopMetricCollector)),
                token_provider: self.token_provider,
                retry_policy,
                scope: self.config.scope,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use crate::transport::memory::MemoryResource;

    #[test]
    fn test_build_with_memory_resource() {
        let client = NakadiClient::builder()
            .base_url("http://broker:8080")
            .resource(Arc::new(MemoryResource::default()))
            .build()
            .unwrap();

        assert_eq!(client.base_url().as_str(), "http://broker:8080/");
        assert_eq!(client.resource().name(), "memory");
        assert!(client.scope().is_none());
        assert!(client.retry_policy().is_none());
        assert!(client.token_provider().is_none());
    }

    #[test]
    fn test_from_config_uses_http_and_retry() {
        let config = ClientConfig::new("https://nakadi.example.com")
            .with_scope("orders.write")
            .with_retry(RetryConfig::default());
        let client = NakadiClient::from_config(config).unwrap();

        assert_eq!(client.resource().name(), "http");
        assert_eq!(client.scope(), Some("orders.write"));
        assert!(client.retry_policy().is_some());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = NakadiClient::builder()
            .base_url("nope")
            .resource(Arc::new(MemoryResource::default()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_client_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<NakadiClient>();
        assert_traits::<EventPublisher>();
    }
}
