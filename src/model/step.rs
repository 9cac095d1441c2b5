//! Pipeline stages and their tracked state.

use serde::{Deserialize, Serialize};

/// One of the six fixed pipeline stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepId {
    Init,
    Research,
    Parsing,
    Analysis,
    Briefing,
    Evaluation,
}

impl StepId {
    pub const ALL: [Self; 6] = [
        Self::Init,
        Self::Research,
        Self::Parsing,
        Self::Analysis,
        Self::Briefing,
        Self::Evaluation,
    ];

    /// Stable identifier, as the backend spells it.
    pub fn id(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Research => "research",
            Self::Parsing => "parsing",
            Self::Analysis => "analysis",
            Self::Briefing => "briefing",
            Self::Evaluation => "evaluation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Init => "Initialization",
            Self::Research => "Research",
            Self::Parsing => "Content Parsing",
            Self::Analysis => "Semantic Analysis",
            Self::Briefing => "Briefing Generation",
            Self::Evaluation => "Evaluation",
        }
    }

    /// Parse a stable identifier. Case-insensitive.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|step| step.id().eq_ignore_ascii_case(id.trim()))
    }
}

/// Where a stage stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepState {
    #[default]
    Pending,
    Running,
    Completed,
    Error,
}

/// A stage and its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub id: StepId,
    pub state: StepState,
}

impl StepStatus {
    pub fn pending(id: StepId) -> Self {
        Self {
            id,
            state: StepState::Pending,
        }
    }

    pub fn label(&self) -> &'static str {
        self.id.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_id() {
        for step in StepId::ALL {
            assert_eq!(StepId::from_id(step.id()), Some(step));
        }
        assert_eq!(StepId::from_id(" Research "), Some(StepId::Research));
        assert_eq!(StepId::from_id("publishing"), None);
    }
}
