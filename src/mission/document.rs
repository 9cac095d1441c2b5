//! Document buffer: the latest generated briefing, editable by the operator.

use crate::model::{ClassifiedEvent, EventKind};

/// Data key of the primary generated document.
pub const BRIEFING_KEY: &str = "briefing";

#[derive(Debug, Clone, Default)]
pub struct DocumentBuffer {
    text: String,
    received: bool,
}

impl DocumentBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the pipeline has delivered a document this run.
    pub fn received(&self) -> bool {
        self.received
    }

    /// Replace the text if `event` carries the briefing. Returns whether it did.
    pub fn on_data(&mut self, event: &ClassifiedEvent) -> bool {
        if event.kind != EventKind::Data || event.key.as_deref() != Some(BRIEFING_KEY) {
            return false;
        }
        self.text = event.content.to_document();
        self.received = true;
        true
    }

    /// Operator edit. Kept until the next briefing arrives.
    pub fn edit(&mut self, text: String) {
        self.text = text;
    }
}
