//! Mission log: append-only record of what the operator is shown.

use jiff::Timestamp;

use crate::model::{ClassifiedEvent, EventKind, LogRecord};

/// Data keys worth showing in the log. Other data events are silent.
pub const LOGGED_DATA_KEYS: [&str; 2] = ["keywords", "competitors"];

/// Longest prefix of a data payload kept in the log, in characters.
pub const DATA_PREVIEW_CHARS: usize = 100;

/// Appended after a data preview.
pub const ELLIPSIS: &str = "...";

pub const MISSION_COMPLETE: &str = "Mission Complete";
pub const CONNECTION_LOST: &str = "Connection lost";

/// Append-only, arrival-ordered mission log.
#[derive(Debug, Clone, Default)]
pub struct LogAggregator {
    records: Vec<LogRecord>,
}

impl LogAggregator {
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Append the record for `event`, if its kind is shown.
    ///
    /// Returns whether anything was appended.
    pub fn record(&mut self, event: &ClassifiedEvent) -> bool {
        let Some(content) = render(event) else {
            return false;
        };
        self.push(event.kind.clone(), content, event.received_at);
        true
    }

    /// Append the synthetic record for a dropped connection.
    pub fn connection_lost(&mut self, at: Timestamp) {
        self.push(EventKind::Error, CONNECTION_LOST.to_string(), at);
    }

    fn push(&mut self, kind: EventKind, content: String, timestamp: Timestamp) {
        self.records.push(LogRecord {
            kind,
            content,
            timestamp,
        });
    }
}

fn render(event: &ClassifiedEvent) -> Option<String> {
    match &event.kind {
        EventKind::Status | EventKind::Log | EventKind::Error => Some(event.content.render()),
        EventKind::Data => {
            let key = event.key.as_deref()?;
            LOGGED_DATA_KEYS.contains(&key).then(|| {
                let json = event.content.to_json();
                format!("{key}: {}{ELLIPSIS}", preview(&json))
            })
        }
        EventKind::Complete => Some(MISSION_COMPLETE.to_string()),
        EventKind::Unrecognized(name) => Some(format!("{name}: {}", event.content.render())),
    }
}

/// The first [`DATA_PREVIEW_CHARS`] characters of `text`.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(DATA_PREVIEW_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
