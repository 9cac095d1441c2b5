//! Decoding raw stream messages into classified events.
//!
//! The backend puts the human-relevant payload under different field names
//! depending on the event kind, so content is resolved by precedence rather
//! than by kind: `message`, then `data`, then `report`, then `content`.

use jiff::Timestamp;
use serde_json::{Map, Value};

use crate::model::{ClassifiedEvent, Content, EventKind};

/// Payload fields checked for content, highest precedence first.
const CONTENT_FIELDS: [&str; 4] = ["message", "data", "report", "content"];

/// Why a raw message could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no string `type` field")]
    MissingType,
}

/// Decode one raw message received at `received_at`.
pub fn parse_event(raw: &str, received_at: Timestamp) -> Result<ClassifiedEvent, ParseError> {
    let Value::Object(mut fields) = serde_json::from_str::<Value>(raw)? else {
        return Err(ParseError::NotAnObject);
    };

    let kind = match fields.get("type") {
        Some(Value::String(name)) => EventKind::from_wire(name),
        _ => return Err(ParseError::MissingType),
    };

    Ok(ClassifiedEvent {
        kind,
        content: resolve_content(&mut fields),
        key: take_string(&mut fields, "key"),
        step: take_string(&mut fields, "step"),
        received_at,
    })
}

/// The first present content field, or empty text.
///
/// Falsy values count as absent: `null`, `false`, zero and empty strings.
/// Empty arrays and objects are still content.
fn resolve_content(fields: &mut Map<String, Value>) -> Content {
    CONTENT_FIELDS
        .iter()
        .find(|name| fields.get(**name).is_some_and(is_present))
        .and_then(|name| fields.remove(*name))
        .map(Content::from_value)
        .unwrap_or_default()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn take_string(fields: &mut Map<String, Value>, name: &str) -> Option<String> {
    match fields.remove(name) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
