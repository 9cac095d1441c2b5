//! Classified events: one decoded message from the mission stream.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded stream message, tagged with its kind and normalized content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedEvent {
    pub kind: EventKind,
    pub content: Content,

    /// Which artifact a data event carries (e.g. `briefing`, `keywords`).
    pub key: Option<String>,

    /// Stage identifier sent alongside some status events.
    pub step: Option<String>,

    pub received_at: Timestamp,
}

/// What kind of message the pipeline sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Status,
    Log,
    Data,
    Error,
    Complete,

    /// Any other `type` value. Logged, never acted on.
    Unrecognized(String),
}

impl EventKind {
    /// Map a wire `type` value onto a kind.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "status" => Self::Status,
            "log" => Self::Log,
            "data" => Self::Data,
            "error" => Self::Error,
            "complete" => Self::Complete,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Short tag used when rendering records.
    pub fn tag(&self) -> &str {
        match self {
            Self::Status => "status",
            Self::Log => "log",
            Self::Data => "data",
            Self::Error => "error",
            Self::Complete => "complete",
            Self::Unrecognized(name) => name,
        }
    }
}

/// The human-relevant payload of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Structured(Value),
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Content {
    /// Wrap a JSON value, unwrapping plain strings into text.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            other => Self::Structured(other),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Structured(_) => None,
        }
    }

    /// Text verbatim, structured values as compact JSON.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Structured(v) => v.to_string(),
        }
    }

    /// Compact JSON of the content, strings included (quoted).
    pub fn to_json(&self) -> String {
        match self {
            Self::Text(s) => Value::String(s.clone()).to_string(),
            Self::Structured(v) => v.to_string(),
        }
    }

    /// Text verbatim, structured values as indented JSON.
    pub fn to_document(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Structured(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}
