//! Step tracker: the six-stage progress view derived from status events.
//!
//! The pipeline is treated as strictly sequential. Announcing a stage
//! completes whatever was running and starts the announced one, so at most
//! one stage is ever running. Stages only move forward.

use crate::model::{ClassifiedEvent, StepId, StepState, StepStatus};

use super::classifier::StageClassifier;

pub struct StepTracker {
    steps: [StepStatus; 6],
    classifier: Box<dyn StageClassifier>,
}

impl StepTracker {
    pub fn new(classifier: Box<dyn StageClassifier>) -> Self {
        Self {
            steps: StepId::ALL.map(StepStatus::pending),
            classifier,
        }
    }

    pub fn steps(&self) -> &[StepStatus] {
        &self.steps
    }

    pub fn state(&self, id: StepId) -> StepState {
        self.steps
            .iter()
            .find(|s| s.id == id)
            .map_or(StepState::Pending, |s| s.state)
    }

    /// The stage currently running, if any.
    pub fn running(&self) -> Option<StepId> {
        self.steps
            .iter()
            .find(|s| s.state == StepState::Running)
            .map(|s| s.id)
    }

    /// Feed a status event. Returns the stage it was classified as, if any.
    pub fn on_status(&mut self, event: &ClassifiedEvent) -> Option<StepId> {
        let Some(target) = self.classifier.classify(event) else {
            tracing::debug!(status = %event.content.render(), "status matched no stage");
            return None;
        };
        self.advance(target);
        Some(target)
    }

    /// Start `target`, completing any other running stage.
    ///
    /// A stage that already completed is not reopened.
    pub fn advance(&mut self, target: StepId) {
        if self.state(target) == StepState::Completed {
            tracing::debug!(stage = target.id(), "stage already completed, ignoring");
            return;
        }
        if let Some(previous) = self.running().filter(|&r| r != target) {
            tracing::debug!(from = previous.id(), to = target.id(), "stage handed over");
        }
        for step in &mut self.steps {
            if step.id == target {
                step.state = StepState::Running;
            } else if step.state == StepState::Running {
                step.state = StepState::Completed;
            }
        }
    }

    /// Complete every running stage. Stages never reached stay as they are.
    pub fn finish(&mut self) {
        for step in &mut self.steps {
            if step.state == StepState::Running {
                step.state = StepState::Completed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::mission::classifier::KeywordTable;
    use crate::model::{Content, EventKind};

    fn tracker() -> StepTracker {
        StepTracker::new(Box::new(KeywordTable::default()))
    }

    fn status(text: &str) -> ClassifiedEvent {
        ClassifiedEvent {
            kind: EventKind::Status,
            content: Content::Text(text.into()),
            key: None,
            step: None,
            received_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn running_count(tracker: &StepTracker) -> usize {
        tracker
            .steps()
            .iter()
            .filter(|s| s.state == StepState::Running)
            .count()
    }

    #[test]
    fn starts_all_pending() {
        let tracker = tracker();
        assert_eq!(tracker.steps().len(), 6);
        assert!(tracker.steps().iter().all(|s| s.state == StepState::Pending));
        assert_eq!(tracker.steps()[0].label(), "Initialization");
    }

    #[test]
    fn announcing_a_stage_completes_the_previous_one() {
        let mut tracker = tracker();

        assert_eq!(tracker.on_status(&status("Starting mission...")), Some(StepId::Init));
        assert_eq!(tracker.state(StepId::Init), StepState::Running);

        tracker.on_status(&status("Beginning research phase"));
        assert_eq!(tracker.state(StepId::Init), StepState::Completed);
        assert_eq!(tracker.state(StepId::Research), StepState::Running);
        assert_eq!(tracker.state(StepId::Parsing), StepState::Pending);
    }

    #[test]
    fn repeated_announcement_is_idempotent() {
        let mut tracker = tracker();
        tracker.on_status(&status("Parsing 3 URLs..."));
        tracker.on_status(&status("Parsing again"));
        assert_eq!(tracker.state(StepId::Parsing), StepState::Running);
        assert_eq!(running_count(&tracker), 1);
    }

    #[test]
    fn unmatched_status_changes_nothing() {
        let mut tracker = tracker();
        tracker.on_status(&status("Starting mission"));
        assert_eq!(tracker.on_status(&status("Found 10 competitors")), None);
        assert_eq!(tracker.running(), Some(StepId::Init));
    }

    #[test]
    fn skipping_stages_leaves_them_pending() {
        let mut tracker = tracker();
        tracker.on_status(&status("Starting mission"));
        tracker.on_status(&status("Generating Content Briefing..."));
        assert_eq!(tracker.state(StepId::Init), StepState::Completed);
        assert_eq!(tracker.state(StepId::Research), StepState::Pending);
        assert_eq!(tracker.state(StepId::Briefing), StepState::Running);
    }

    #[test]
    fn completed_stage_is_never_reopened() {
        let mut tracker = tracker();
        tracker.on_status(&status("Running research"));
        tracker.on_status(&status("Parsing 5 URLs"));
        tracker.on_status(&status("More research needed"));

        assert_eq!(tracker.state(StepId::Research), StepState::Completed);
        assert_eq!(tracker.state(StepId::Parsing), StepState::Running);
    }

    #[test]
    fn finish_completes_running_only() {
        let mut tracker = tracker();
        tracker.on_status(&status("Starting mission"));
        tracker.on_status(&status("Parsing"));
        tracker.finish();

        assert_eq!(tracker.state(StepId::Init), StepState::Completed);
        assert_eq!(tracker.state(StepId::Parsing), StepState::Completed);
        assert_eq!(tracker.state(StepId::Research), StepState::Pending);
        assert_eq!(tracker.running(), None);
    }

    #[test]
    fn at_most_one_running_and_no_regression_over_a_long_sequence() {
        let messages = [
            "Starting mission",
            "keywords fetched",
            "Evaluating",
            "research again",
            "semantic analysis",
            "nothing",
            "Parsing",
            "Briefing",
            "Starting mission",
            "evaluating",
        ];
        let mut tracker = tracker();
        let mut previous = tracker.steps().to_vec();

        for message in messages {
            tracker.on_status(&status(message));
            assert!(running_count(&tracker) <= 1, "after {message}");
            for (before, after) in previous.iter().zip(tracker.steps()) {
                let regressed = match before.state {
                    StepState::Completed => after.state != StepState::Completed,
                    StepState::Running => after.state == StepState::Pending,
                    _ => false,
                };
                assert!(!regressed, "{:?} regressed after {message}", before.id);
            }
            previous = tracker.steps().to_vec();
        }
    }
}
