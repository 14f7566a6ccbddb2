//! Transport abstraction: one HTTP attempt against the broker
//!
//! A `Resource` performs exactly one POST and returns whatever status the
//! broker answered with. Retries, metrics and timing live above it.

use crate::error::Result;
use crate::options::ResourceOptions;
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;

pub mod http;
pub mod memory;

/// Executes publish requests
#[async_trait]
pub trait Resource: Send + Sync {
    /// POST a batch of events to a collection endpoint
    ///
    /// Any HTTP status is returned as `Ok`; only failures to obtain a
    /// response (connection, timeout) are errors.
    async fn post_events(
        &self,
        url: &str,
        options: &ResourceOptions,
        body: RequestBody,
    ) -> Result<Response>;

    /// Transport name (e.g., "http", "memory")
    fn name(&self) -> &str;
}

/// Body of a publish request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Pre-serialized bytes, sent verbatim
    Raw(Bytes),
    /// Mapped events, serialized as one JSON array
    Json(Vec<serde_json::Value>),
}

impl RequestBody {
    /// The bytes that go on the wire
    pub fn to_bytes(&self) -> Result<Bytes> {
        match self {
            Self::Raw(bytes) => Ok(bytes.clone()),
            Self::Json(values) => Ok(Bytes::from(serde_json::to_vec(values)?)),
        }
    }
}

/// A broker response with its body fully read
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_bytes() {
        let raw = RequestBody::Raw(Bytes::from_static(b"[a,b]"));
        assert_eq!(raw.to_bytes().unwrap(), Bytes::from_static(b"[a,b]"));

        let structured = RequestBody::Json(vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(
            structured.to_bytes().unwrap(),
            Bytes::from_static(br#"[{"id":1},{"id":2}]"#)
        );
    }

    #[test]
    fn test_response_accessors() {
        let response = Response::new(207, r#"[{"publishing_status":"failed"}]"#)
            .with_header("Content-Type", "application/json");

        assert_eq!(response.status(), 207);
        assert!(response.is_success());
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert!(response.header("retry-after").is_none());

        let items: Vec<serde_json::Value> = response.json().unwrap();
        assert_eq!(items.len(), 1);
        assert!(response.text().contains("failed"));
    }

    #[test]
    fn test_response_json_error() {
        let response = Response::new(422, "not json");
        assert!(!response.is_success());
        assert!(response.json::<Vec<serde_json::Value>>().is_err());
    }
}
