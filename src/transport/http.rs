//! HTTP transport backed by `reqwest`

use super::{RequestBody, Resource, Response};
use crate::config::ClientConfig;
use crate::error::{PublishError, Result};
use crate::options::ResourceOptions;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

/// Sends publish requests over HTTP(S)
///
/// Connection pooling and TLS are `reqwest`'s; one `HttpResource` should be
/// shared by every publisher of a client.
#[derive(Debug, Clone)]
pub struct HttpResource {
    client: reqwest::Client,
}

impl HttpResource {
    /// Build a transport from client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PublishError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for HttpResource {
    async fn post_events(
        &self,
        url: &str,
        options: &ResourceOptions,
        body: RequestBody,
    ) -> Result<Response> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, options.content_type());

        if let Some(authorization) = options.authorization() {
            request = request.header(AUTHORIZATION, authorization.expose());
        }

        let response = request
            .body(body.to_bytes()?)
            .send()
            .await
            .map_err(|e| map_send_error(url, e))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(url, e))?;

        tracing::debug!(url, status, bytes = body.len(), "Publish request completed");

        let mut out = Response::new(status, body);
        for (name, value) in headers {
            out = out.with_header(name, value);
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn map_send_error(url: &str, e: reqwest::Error) -> PublishError {
    // Rejected while building the request, before any I/O
    if e.is_builder() {
        PublishError::InvalidArgument(format!("Invalid request to '{}': {}", url, e))
    } else if e.is_timeout() {
        PublishError::Timeout {
            url: url.to_string(),
        }
    } else {
        PublishError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}
