//! Structured event mapping
//!
//! Turns an `EventRecord` into the JSON value placed in the request body.
//! Business and data events get the platform `metadata` envelope filled in
//! when the caller left it out; nothing the caller set is overwritten.

use crate::types::{EventCategory, EventPayload, EventRecord};
use serde_json::{Map, Value};

/// Map one structured record to its wire value
///
/// Raw payloads are returned as JSON strings; callers that want them sent
/// verbatim must take the raw path instead.
pub fn to_wire(record: &EventRecord) -> Value {
    match record.payload() {
        EventPayload::Raw(text) => Value::String(text.clone()),
        EventPayload::Structured(value) => {
            enrich(value.clone(), record.event_type().category)
        }
    }
}

fn enrich(value: Value, category: EventCategory) -> Value {
    match (category, value) {
        (EventCategory::Business | EventCategory::Data, Value::Object(mut object)) => {
            let metadata = object
                .entry("metadata")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(metadata) = metadata {
                metadata
                    .entry("eid")
                    .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
                metadata.entry("occurred_at").or_insert_with(|| {
                    Value::String(
                        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                    )
                });
            }
            Value::Object(object)
        }
        (_, value) => value,
    }
}
