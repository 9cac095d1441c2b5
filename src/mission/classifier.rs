//! Stage classification: which pipeline stage a status event points at.
//!
//! The backend reports progress as prose, so the default classifier is a
//! keyword table scanned in order. It is a heuristic and will drift if the
//! backend rewords its messages. The table sits behind [`StageClassifier`]
//! so it can be swapped without touching the transition logic.

use serde::{Deserialize, Serialize};

use crate::model::{ClassifiedEvent, StepId};

/// Maps a status event to the stage it announces, if any.
pub trait StageClassifier: Send {
    fn classify(&self, event: &ClassifiedEvent) -> Option<StepId>;
}

/// Which classifier a mission uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    /// Keyword table over the status text.
    #[default]
    Keywords,

    /// The event's `step` field, falling back to the keyword table.
    StepField,
}

impl ClassifierKind {
    pub fn build(self) -> Box<dyn StageClassifier> {
        match self {
            Self::Keywords => Box::new(KeywordTable::default()),
            Self::StepField => Box::new(StepFieldClassifier::default()),
        }
    }
}

/// One row of a keyword table: any keyword matching selects the stage.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub stage: StepId,
}

impl KeywordRule {
    pub fn new(keywords: &[&str], stage: StepId) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            stage,
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Ordered keyword table. First matching rule wins.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
}

impl KeywordTable {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    /// Classify free text, case-insensitively.
    pub fn classify_text(&self, text: &str) -> Option<StepId> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.stage)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        // Order matters: "Evaluating Briefing..." lands on briefing.
        Self::new(vec![
            KeywordRule::new(&["starting mission"], StepId::Init),
            KeywordRule::new(&["research", "keywords"], StepId::Research),
            KeywordRule::new(&["parsing"], StepId::Parsing),
            KeywordRule::new(&["semantic analysis"], StepId::Analysis),
            KeywordRule::new(&["briefing"], StepId::Briefing),
            KeywordRule::new(&["evaluating"], StepId::Evaluation),
        ])
    }
}

impl StageClassifier for KeywordTable {
    fn classify(&self, event: &ClassifiedEvent) -> Option<StepId> {
        self.classify_text(event.content.as_text()?)
    }
}

/// Trusts the structured `step` field when it names a known stage.
#[derive(Debug, Clone, Default)]
pub struct StepFieldClassifier {
    fallback: KeywordTable,
}

impl StageClassifier for StepFieldClassifier {
    fn classify(&self, event: &ClassifiedEvent) -> Option<StepId> {
        event
            .step
            .as_deref()
            .and_then(StepId::from_id)
            .or_else(|| self.fallback.classify(event))
    }
}
