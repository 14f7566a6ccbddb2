//! Event publisher
//!
//! Every publish call goes through the same pipeline:
//!
//! 1. validate the event type and events locally (no network on failure)
//! 2. build the body: raw texts are joined verbatim into one JSON array,
//!    structured values are mapped per record and sent as a list
//! 3. resolve scope and URI, then POST under the retry policy
//! 4. record `Timer::EventSend` once, and the send meters when a response
//!    came back
//!
//! `publish_batch` additionally decodes the per-event outcomes of 207 and
//! 422 responses.

use crate::auth::{resolve_scope, EVENT_STREAM_WRITE};
use crate::client::NakadiClient;
use crate::error::{PublishError, Result};
use crate::mapping;
use crate::metrics::{classify_send, Timer};
use crate::options::{PublishOptions, ResourceOptions, APPLICATION_JSON};
use crate::retry::{with_retry, RetryPolicy};
use crate::transport::{RequestBody, Response};
use crate::types::{
    BatchItemResponse, BatchItemResponseCollection, EventBatch, EventPayload, EventRecord,
    EventType,
};
use crate::uri::collection_uri;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

/// Title of the local problem raised for an empty batch
pub const EMPTY_BATCH: &str = "event send called with zero events";

/// Publishes events to collection endpoints
///
/// Holds immutable scope/retry overrides on top of the client's defaults.
/// Per-call overrides go through the `*_with` methods.
#[derive(Clone)]
pub struct EventPublisher {
    client: NakadiClient,
    scope: Option<String>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
}

impl EventPublisher {
    pub(crate) fn new(client: NakadiClient) -> Self {
        Self {
            client,
            scope: None,
            retry_policy: None,
        }
    }

    /// Publisher presenting `scope` instead of the client default
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Publisher wrapping sends in `policy` instead of the client default
    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Publish one event
    pub async fn publish(
        &self,
        event_type: impl Into<EventType>,
        event: impl Into<EventPayload>,
    ) -> Result<Response> {
        self.publish_with(event_type, event, &PublishOptions::default())
            .await
    }

    /// Publish one event with per-call overrides
    ///
    /// Raw text is wrapped as `[text]` and sent verbatim; structured values
    /// take the batch path.
    pub async fn publish_with(
        &self,
        event_type: impl Into<EventType>,
        event: impl Into<EventPayload>,
        opts: &PublishOptions,
    ) -> Result<Response> {
        let event_type = event_type.into();
        event_type.validate()?;

        match event.into() {
            EventPayload::Raw(text) => {
                let body = RequestBody::Raw(Bytes::from(format!("[{}]", text)));
                self.send(&event_type, body, 1, opts).await
            }
            EventPayload::Structured(value) => {
                self.publish_all_with(event_type, EventBatch::Structured(vec![value]), opts)
                    .await
            }
        }
    }

    /// Publish a batch of events, preserving order
    pub async fn publish_all(
        &self,
        event_type: impl Into<EventType>,
        events: impl Into<EventBatch>,
    ) -> Result<Response> {
        self.publish_all_with(event_type, events, &PublishOptions::default())
            .await
    }

    /// Publish a batch of events with per-call overrides
    pub async fn publish_all_with(
        &self,
        event_type: impl Into<EventType>,
        events: impl Into<EventBatch>,
        opts: &PublishOptions,
    ) -> Result<Response> {
        let event_type = event_type.into();
        event_type.validate()?;

        let events = events.into();
        if events.is_empty() {
            return Err(PublishError::local_problem(EMPTY_BATCH, ""));
        }

        // Raw text is one opaque payload however many events it joins
        let event_count = if events.is_raw() { 1 } else { events.len() };
        let body = build_body(&event_type, events)?;
        self.send(&event_type, body, event_count, opts).await
    }

    /// Publish pre-built records
    ///
    /// All records must name the same event type and share one payload shape.
    pub async fn publish_records(&self, records: Vec<EventRecord>) -> Result<Response> {
        self.publish_records_with(records, &PublishOptions::default())
            .await
    }

    /// Publish pre-built records with per-call overrides
    pub async fn publish_records_with(
        &self,
        records: Vec<EventRecord>,
        opts: &PublishOptions,
    ) -> Result<Response> {
        let event_type = match records.first() {
            Some(record) => record.event_type().clone(),
            None => return Err(PublishError::local_problem(EMPTY_BATCH, "")),
        };

        if records
            .iter()
            .any(|record| record.event_type().name != event_type.name)
        {
            return Err(PublishError::InvalidArgument(format!(
                "All records must target event type '{}'",
                event_type.name
            )));
        }

        let batch = records_to_batch(records)?;
        self.publish_all_with(event_type, batch, opts).await
    }

    /// Publish a batch and report per-event outcomes
    pub async fn publish_batch(
        &self,
        event_type: impl Into<EventType>,
        events: impl Into<EventBatch>,
    ) -> Result<BatchOutcome> {
        self.publish_batch_with(event_type, events, &PublishOptions::default())
            .await
    }

    /// Publish a batch with per-call overrides and report per-event outcomes
    ///
    /// Only 207 and 422 responses carry outcomes. A body that fails to
    /// decode yields `BatchItems::DecodeFailed`; the response is still
    /// returned.
    pub async fn publish_batch_with(
        &self,
        event_type: impl Into<EventType>,
        events: impl Into<EventBatch>,
        opts: &PublishOptions,
    ) -> Result<BatchOutcome> {
        let event_type = event_type.into();
        let response = self.publish_all_with(event_type.clone(), events, opts).await?;

        let items = match response.status() {
            207 | 422 => match response.json::<Vec<BatchItemResponse>>() {
                Ok(items) => BatchItems::Decoded(BatchItemResponseCollection::new(items)),
                Err(e) => {
                    tracing::warn!(
                        event_type = %event_type.name,
                        status = response.status(),
                        error = %e,
                        "Failed to decode batch item responses"
                    );
                    BatchItems::DecodeFailed {
                        reason: e.to_string(),
                    }
                }
            },
            _ => BatchItems::NotReported,
        };

        Ok(BatchOutcome { response, items })
    }

    /// Time one send and classify its outcome
    async fn send(
        &self,
        event_type: &EventType,
        body: RequestBody,
        event_count: usize,
        opts: &PublishOptions,
    ) -> Result<Response> {
        let metrics = self.client.metrics();
        let start = Instant::now();

        let result = self.execute(event_type, body, opts).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                for (meter, count) in classify_send(response.status(), event_count) {
                    metrics.mark_count(meter, count);
                }
                tracing::debug!(
                    event_type = %event_type.name,
                    events = event_count,
                    status = response.status(),
                    ?elapsed,
                    "Events sent"
                );
            }
            Err(e) => {
                tracing::debug!(
                    event_type = %event_type.name,
                    events = event_count,
                    error = %e,
                    ?elapsed,
                    "Event send failed"
                );
            }
        }
        metrics.duration(Timer::EventSend, elapsed);

        result
    }

    async fn execute(
        &self,
        event_type: &EventType,
        body: RequestBody,
        opts: &PublishOptions,
    ) -> Result<Response> {
        let scope = resolve_scope(
            opts.scope
                .as_deref()
                .or(self.scope.as_deref())
                .or(self.client.scope()),
            EVENT_STREAM_WRITE,
        );
        let options = ResourceOptions::new(APPLICATION_JSON, scope)
            .token_provider(self.client.token_provider());
        let url = collection_uri(self.client.base_url(), &event_type.name)?;

        let policy = opts
            .retry_policy
            .as_deref()
            .or(self.retry_policy.as_deref())
            .or(self.client.retry_policy());

        let resource = self.client.resource();
        let (url, options, body) = (url.as_str(), &options, &body);
        with_retry(policy, self.client.metrics(), move |_attempt| {
            resource.post_events(url, options, body.clone())
        })
        .await
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("client", &self.client)
            .field("scope", &self.scope)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

/// Per-event outcomes of a batch publish
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItems {
    /// The broker reported no per-event outcomes (any status but 207/422)
    NotReported,
    /// Outcomes decoded from a 207 or 422 body
    Decoded(BatchItemResponseCollection),
    /// A 207 or 422 body that could not be decoded
    DecodeFailed { reason: String },
}

/// Result of `publish_batch`: the HTTP response plus per-event outcomes
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub response: Response,
    pub items: BatchItems,
}

impl BatchOutcome {
    pub fn status(&self) -> u16 {
        self.response.status()
    }

    /// Decoded outcomes; empty unless the body decoded
    pub fn items(&self) -> &[BatchItemResponse] {
        match &self.items {
            BatchItems::Decoded(collection) => &collection.items,
            _ => &[],
        }
    }

    /// Outcomes as a collection; empty unless the body decoded
    pub fn collection(&self) -> BatchItemResponseCollection {
        match &self.items {
            BatchItems::Decoded(collection) => collection.clone(),
            _ => BatchItemResponseCollection::default(),
        }
    }

    pub fn decode_failed(&self) -> bool {
        matches!(self.items, BatchItems::DecodeFailed { .. })
    }
}

fn build_body(event_type: &EventType, events: EventBatch) -> Result<RequestBody> {
    match events {
        EventBatch::Raw(texts) => Ok(RequestBody::Raw(Bytes::from(format!(
            "[{}]",
            texts.join(",")
        )))),
        EventBatch::Structured(values) => {
            let mut mapped = Vec::with_capacity(values.len());
            for value in values {
                if value.is_null() {
                    return Err(PublishError::InvalidArgument(
                        "Please provide an event".to_string(),
                    ));
                }
                let record = EventRecord::new(event_type.clone(), value);
                mapped.push(mapping::to_wire(&record));
            }
            Ok(RequestBody::Json(mapped))
        }
    }
}

fn records_to_batch(records: Vec<EventRecord>) -> Result<EventBatch> {
    let raw = records
        .first()
        .map(|record| record.payload().is_raw())
        .unwrap_or(false);

    let mixed = || {
        PublishError::InvalidArgument(
            "Records mix raw text and structured payloads".to_string(),
        )
    };

    if raw {
        records
            .into_iter()
            .map(|record| match record.into_payload() {
                EventPayload::Raw(text) => Ok(text),
                EventPayload::Structured(_) => Err(mixed()),
            })
            .collect::<Result<Vec<_>>>()
            .map(EventBatch::Raw)
    } else {
        records
            .into_iter()
            .map(|record| match record.into_payload() {
                EventPayload::Structured(value) => Ok(value),
                EventPayload::Raw(_) => Err(mixed()),
            })
            .collect::<Result<Vec<_>>>()
            .map(EventBatch::Structured)
    }
}
