//! Core event types for the a3s-nakadi client
//!
//! Wire types use the platform's snake_case JSON field names.

use crate::error::{PublishError, Result};
use serde::{Deserialize, Serialize};

/// Category of an event type, controlling which envelope the broker expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Free-form payloads, no platform envelope
    #[default]
    Undefined,
    /// Business events carrying platform `metadata`
    Business,
    /// Data change events carrying platform `metadata`
    Data,
}

/// The parts of an event type the publisher reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    /// Event type name (e.g. "order.created")
    pub name: String,

    /// Event type category
    #[serde(default)]
    pub category: EventCategory,
}

impl EventType {
    pub fn new(name: impl Into<String>, category: EventCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }

    /// Event type with the `business` category
    pub fn business(name: impl Into<String>) -> Self {
        Self::new(name, EventCategory::Business)
    }

    /// Event type with the `data` category
    pub fn data(name: impl Into<String>) -> Self {
        Self::new(name, EventCategory::Data)
    }

    /// Reject names that cannot address a collection endpoint
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PublishError::InvalidArgument(
                "Please provide an event type name".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::new(name, EventCategory::Undefined)
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::new(name, EventCategory::Undefined)
    }
}

impl From<&EventType> for EventType {
    fn from(event_type: &EventType) -> Self {
        event_type.clone()
    }
}

/// One event as handed to the publisher
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Already-serialized JSON text, sent verbatim
    Raw(String),
    /// Structured value, mapped and serialized by the client
    Structured(serde_json::Value),
}

impl EventPayload {
    /// Serialize any value into a structured payload
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Structured(serde_json::to_value(value)?))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl From<String> for EventPayload {
    fn from(text: String) -> Self {
        Self::Raw(text)
    }
}

impl From<&str> for EventPayload {
    fn from(text: &str) -> Self {
        Self::Raw(text.to_string())
    }
}

impl From<serde_json::Value> for EventPayload {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// An ordered batch of events of a single shape
///
/// A batch is either entirely pre-serialized text or entirely structured
/// values; mixing the two is not representable.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBatch {
    /// Already-serialized JSON texts, joined verbatim into one array
    Raw(Vec<String>),
    /// Structured values, mapped and serialized by the client
    Structured(Vec<serde_json::Value>),
}

impl EventBatch {
    /// Serialize a slice of values into a structured batch
    pub fn json<T: Serialize>(values: &[T]) -> Result<Self> {
        let values = values
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::Structured(values))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Raw(texts) => texts.len(),
            Self::Structured(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl From<EventPayload> for EventBatch {
    fn from(payload: EventPayload) -> Self {
        match payload {
            EventPayload::Raw(text) => Self::Raw(vec![text]),
            EventPayload::Structured(value) => Self::Structured(vec![value]),
        }
    }
}

impl From<Vec<String>> for EventBatch {
    fn from(texts: Vec<String>) -> Self {
        Self::Raw(texts)
    }
}

impl From<Vec<&str>> for EventBatch {
    fn from(texts: Vec<&str>) -> Self {
        Self::Raw(texts.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<serde_json::Value>> for EventBatch {
    fn from(values: Vec<serde_json::Value>) -> Self {
        Self::Structured(values)
    }
}

/// An event paired with the event type it is published to
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    event_type: EventType,
    payload: EventPayload,
}

impl EventRecord {
    pub fn new(event_type: impl Into<EventType>, payload: impl Into<EventPayload>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: payload.into(),
        }
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn into_payload(self) -> EventPayload {
        self.payload
    }
}

/// Outcome of publishing one event in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStatus {
    Submitted,
    Failed,
    Aborted,
    #[serde(other)]
    Unknown,
}

/// Step at which publishing of an event stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStep {
    #[default]
    None,
    Validating,
    Partitioning,
    Enriching,
    Publishing,
    #[serde(other)]
    Unknown,
}

/// Per-event outcome reported by a 207 or 422 response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResponse {
    /// Event id (`metadata.eid`) of the submitted event, when it had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eid: Option<String>,

    pub publishing_status: PublishingStatus,

    #[serde(default)]
    pub step: PublishingStep,

    /// Human-readable explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A navigation link attached to a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}

/// Ordered per-event outcomes plus navigation links
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResponseCollection {
    pub items: Vec<BatchItemResponse>,
    #[serde(default)]
    pub links: Vec<ResourceLink>,
}

impl BatchItemResponseCollection {
    pub fn new(items: Vec<BatchItemResponse>) -> Self {
        Self {
            items,
            links: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items the broker did not accept
    pub fn failed(&self) -> impl Iterator<Item = &BatchItemResponse> {
        self.items
            .iter()
            .filter(|item| item.publishing_status != PublishingStatus::Submitted)
    }
}
