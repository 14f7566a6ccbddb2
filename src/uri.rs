//! Collection endpoint URIs

use crate::error::{PublishError, Result};
use reqwest::Url;

/// Path segment for event type resources
pub const PATH_EVENT_TYPES: &str = "event-types";

/// Path segment for an event type's collection
pub const PATH_COLLECTION: &str = "events";

/// Appends percent-encoded path segments to a base address
///
/// Any path already on the base (e.g. a gateway prefix) is kept.
#[derive(Debug, Clone)]
pub struct UriBuilder {
    base: Url,
    segments: Vec<String>,
}

impl UriBuilder {
    pub fn new(base: &Url) -> Self {
        Self {
            base: base.clone(),
            segments: Vec::new(),
        }
    }

    /// Append one path segment; `/` inside it is encoded, not split
    pub fn path(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn build(self) -> Result<Url> {
        let mut url = self.base;
        url.path_segments_mut()
            .map_err(|_| PublishError::Uri("base address cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(&self.segments);
        Ok(url)
    }
}

/// `{base}/event-types/{name}/events`
pub fn collection_uri(base: &Url, event_type_name: &str) -> Result<Url> {
    UriBuilder::new(base)
        .path(PATH_EVENT_TYPES)
        .path(event_type_name)
        .path(PATH_COLLECTION)
        .build()
}

/// Parse a base address, rejecting ones that cannot carry a path
pub fn parse_base(base: &str) -> Result<Url> {
    let url = Url::parse(base)
        .map_err(|e| PublishError::Uri(format!("Invalid base address '{}': {}", base, e)))?;
    if url.cannot_be_a_base() {
        return Err(PublishError::Uri(format!(
            "'{}' cannot be used as a base address",
            base
        )));
    }
    Ok(url)
}
