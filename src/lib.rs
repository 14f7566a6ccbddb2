//! # a3s-nakadi
//!
//! Client-side event publishing for Nakadi-style event streaming platforms.
//!
//! ## Overview
//!
//! `a3s-nakadi` submits single events or ordered batches to an event type's
//! collection endpoint (`{base}/event-types/{name}/events`). Every send is
//! timed, classified into meters, optionally retried, and batch publishes
//! report the broker's per-event outcomes.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_nakadi::{EventType, NakadiClient};
//! use a3s_nakadi::transport::memory::MemoryResource;
//! use std::sync::Arc;
//!
//! # async fn example() -> a3s_nakadi::Result<()> {
//! let client = NakadiClient::builder()
//!     .base_url("http://localhost:8080")
//!     .resource(Arc::new(MemoryResource::default()))
//!     .build()?;
//!
//! // Raw text is sent verbatim
//! client.events().publish("order.created", r#"{"id":"A1"}"#).await?;
//!
//! // Structured business events get a metadata envelope
//! let outcome = client
//!     .events()
//!     .publish_batch(
//!         EventType::business("order.created"),
//!         vec![serde_json::json!({"id": "A2"}), serde_json::json!({"id": "A3"})],
//!     )
//!     .await?;
//!
//! for item in outcome.items() {
//!     println!("{:?}: {:?}", item.eid, item.publishing_status);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Transports
//!
//! - **http** — reqwest-backed transport for real brokers
//! - **memory** — scriptable transport for tests and embedding
//!
//! ## Architecture
//!
//! - **NakadiClient** — shared collaborators and immutable defaults
//! - **EventPublisher** — the publish pipeline
//! - **Resource** trait — one HTTP attempt, any status is a response
//! - **RetryPolicy** trait — decides whether and when to repeat an attempt
//! - **MetricCollector** trait — sink for meters and timers

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod metrics;
pub mod options;
pub mod publisher;
pub mod retry;
pub mod transport;
pub mod types;
pub mod uri;

// Re-export core types
pub use auth::{
    ScopedTokenProvider, SecretString, StaticTokenProvider, TokenProvider, EVENT_STREAM_READ,
    EVENT_STREAM_WRITE,
};
pub use client::{NakadiClient, NakadiClientBuilder};
pub use config::ClientConfig;
pub use error::{PublishError, Result};
pub use metrics::{
    MemoryMetricCollector, Meter, MetricCollector, NoopMetricCollector, Timer,
    TracingMetricCollector,
};
pub use options::{PublishOptions, ResourceOptions};
pub use publisher::{BatchItems, BatchOutcome, EventPublisher};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::{RequestBody, Resource, Response};
pub use types::{
    BatchItemResponse, BatchItemResponseCollection, EventBatch, EventCategory, EventPayload,
    EventRecord, EventType, PublishingStatus, PublishingStep, ResourceLink,
};

// Re-export transports for convenience
pub use transport::http::HttpResource;
pub use transport::memory::{MemoryResource, RecordedRequest};
