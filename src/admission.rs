// src/admission.rs
//! Admission pipeline: raw text frame -> `FeedEvent` or `DecodeFailure`.
//!
//! Decoding never panics and never touches the store. The caller decides what
//! to do with the result; a rejected frame simply produces no new item.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};

use crate::event::{Category, FeedEvent};

#[derive(Debug, thiserror::Error)]
pub enum DecodeFailure {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing or non-string field `{0}`")]
    MissingField(&'static str),
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_admitted_total", "Payloads decoded and admitted, by category.");
        describe_counter!("feed_rejected_total", "Payloads rejected by the decoder.");
    });
}

/// Pure decode of one wire payload.
pub fn decode(raw: &str) -> Result<FeedEvent, DecodeFailure> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = value else {
        return Err(DecodeFailure::NotAnObject);
    };

    let timestamp = string_field(&map, "timestamp")?;
    let kind = string_field(&map, "type")?;
    let content = string_field(&map, "content")?;

    let category = kind
        .parse::<Category>()
        .map_err(|e| DecodeFailure::UnknownCategory(e.0))?;

    Ok(FeedEvent {
        timestamp: timestamp.to_string(),
        category,
        content: content.to_string(),
    })
}

fn string_field<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, DecodeFailure> {
    map.get(key)
        .and_then(Value::as_str)
        .ok_or(DecodeFailure::MissingField(key))
}

/// Decode plus telemetry. Rejections are logged at debug level only.
pub fn admit(raw: &str) -> Result<FeedEvent, DecodeFailure> {
    ensure_metrics_described();

    match decode(raw) {
        Ok(ev) => {
            counter!("feed_admitted_total", "category" => ev.category.as_str()).increment(1);
            Ok(ev)
        }
        Err(e) => {
            counter!("feed_rejected_total").increment(1);
            tracing::debug!(error = %e, "payload rejected");
            Err(e)
        }
    }
}
