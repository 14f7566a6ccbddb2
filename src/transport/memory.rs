//! In-memory transport for testing and embedding
//!
//! Answers from a queue of scripted outcomes and records every request it
//! receives. When the queue is empty it answers with the default status.

use super::{RequestBody, Resource, Response};
use crate::error::{PublishError, Result};
use crate::options::ResourceOptions;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// A request observed by `MemoryResource`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub content_type: String,
    pub scope: String,
    /// Exposed `Authorization` header value, if any
    pub authorization: Option<String>,
    pub body: RequestBody,
}

impl RecordedRequest {
    /// Body as the text that would go on the wire
    pub fn body_text(&self) -> String {
        self.body
            .to_bytes()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Respond(Response),
    TransportError(String),
}

/// Scriptable in-memory transport
#[derive(Debug)]
pub struct MemoryResource {
    default_status: u16,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for MemoryResource {
    fn default() -> Self {
        Self::new(200)
    }
}

impl MemoryResource {
    /// Transport answering `default_status` with an empty body once the
    /// script runs out
    pub fn new(default_status: u16) -> Self {
        Self {
            default_status,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for the next request
    pub async fn push_response(&self, response: Response) {
        self.script.lock().await.push_back(Scripted::Respond(response));
    }

    /// Queue a connection failure for the next request
    pub async fn push_transport_error(&self, reason: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::TransportError(reason.into()));
    }

    /// All requests received so far, oldest first
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests received so far
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl Resource for MemoryResource {
    async fn post_events(
        &self,
        url: &str,
        options: &ResourceOptions,
        body: RequestBody,
    ) -> Result<Response> {
        self.requests.lock().await.push(RecordedRequest {
            url: url.to_string(),
            content_type: options.content_type().to_string(),
            scope: options.scope().to_string(),
            authorization: options.authorization().map(|a| a.expose().to_string()),
            body,
        });

        let next = self.script.lock().await.pop_front();
        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::TransportError(reason)) => Err(PublishError::Transport {
                url: url.to_string(),
                reason,
            }),
            None => Ok(Response::new(self.default_status, bytes::Bytes::new())),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}
