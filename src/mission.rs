//! Mission state: the step tracker, log, and document folded from one stream.
//!
//! A [`Mission`] owns all three views and is only ever mutated from the
//! dispatch loop that consumes the stream, one message at a time, in arrival
//! order. Presentation layers see it through [`MissionSnapshot`]s.

pub mod classifier;
pub mod document;
pub mod log;
pub mod parser;
pub mod steps;

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{ClassifiedEvent, EventKind, LogRecord, MissionConfig, StepStatus};

use classifier::StageClassifier;
use document::DocumentBuffer;
use log::LogAggregator;
use steps::StepTracker;

/// Lifecycle of the mission's push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    /// No run started.
    Idle,

    /// Connection requested, nothing received yet.
    Open,

    /// At least one message received.
    Active,

    Closed(CloseReason),
}

/// Why a run's connection closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseReason {
    /// The pipeline sent `complete`.
    Completed,

    /// The transport failed before `complete`.
    ConnectionLost,

    /// The operator stopped the run.
    Stopped,
}

/// One mission run's derived state.
pub struct Mission {
    id: Uuid,
    config: MissionConfig,
    connection: ConnectionState,
    steps: StepTracker,
    log: LogAggregator,
    document: DocumentBuffer,
}

impl Mission {
    /// A fresh mission with all stages pending, an empty log, and no document.
    pub fn new(config: MissionConfig, classifier: Box<dyn StageClassifier>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            connection: ConnectionState::Idle,
            steps: StepTracker::new(classifier),
            log: LogAggregator::default(),
            document: DocumentBuffer::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Whether the run is still receiving.
    pub fn is_running(&self) -> bool {
        matches!(
            self.connection,
            ConnectionState::Open | ConnectionState::Active
        )
    }

    pub fn steps(&self) -> &[StepStatus] {
        self.steps.steps()
    }

    pub fn records(&self) -> &[LogRecord] {
        self.log.records()
    }

    pub fn document(&self) -> &str {
        self.document.text()
    }

    /// Mark the connection as requested.
    pub fn open(&mut self) {
        if self.connection == ConnectionState::Idle {
            self.connection = ConnectionState::Open;
        }
    }

    /// Decode and apply one raw message.
    ///
    /// Undecodable messages are dropped with a diagnostic and never reach the log.
    pub fn apply_raw(&mut self, raw: &str) {
        match parser::parse_event(raw, Timestamp::now()) {
            Ok(event) => self.apply(&event),
            Err(e) => {
                tracing::warn!(mission = %self.id, error = %e, "dropping undecodable message");
            }
        }
    }

    /// Fan one event out to the step tracker, log, and document.
    ///
    /// Events arriving after the connection closed are ignored.
    pub fn apply(&mut self, event: &ClassifiedEvent) {
        if !self.is_running() {
            tracing::debug!(
                mission = %self.id,
                kind = event.kind.tag(),
                "ignoring event after close"
            );
            return;
        }
        self.connection = ConnectionState::Active;

        match event.kind {
            EventKind::Status => {
                if let Some(stage) = self.steps.on_status(event) {
                    tracing::info!(mission = %self.id, stage = stage.id(), "stage announced");
                }
            }
            EventKind::Data => {
                if self.document.on_data(event) {
                    tracing::info!(mission = %self.id, "briefing received");
                }
            }
            EventKind::Error => {
                tracing::warn!(
                    mission = %self.id,
                    error = %event.content.render(),
                    "pipeline reported an error"
                );
            }
            EventKind::Unrecognized(ref name) => {
                tracing::debug!(mission = %self.id, kind = %name, "unrecognized event kind");
            }
            EventKind::Log | EventKind::Complete => {}
        }

        self.log.record(event);

        if event.kind == EventKind::Complete {
            self.steps.finish();
            self.close(CloseReason::Completed);
        }
    }

    /// The transport failed. Appends one `Connection lost` record.
    ///
    /// Running stages are left running: nothing claimed they finished.
    pub fn connection_lost(&mut self) {
        if !self.is_running() {
            return;
        }
        self.log.connection_lost(Timestamp::now());
        self.close(CloseReason::ConnectionLost);
    }

    /// The operator stopped the run.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.close(CloseReason::Stopped);
        }
    }

    /// Operator edit of the document. Allowed at any time.
    pub fn edit_document(&mut self, text: String) {
        self.document.edit(text);
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            id: Some(self.id),
            connection: self.connection(),
            running: self.is_running(),
            steps: self.steps().to_vec(),
            records: self.records().to_vec(),
            document: self.document().to_string(),
            document_received: self.document.received(),
        }
    }

    fn close(&mut self, reason: CloseReason) {
        tracing::info!(mission = %self.id, ?reason, "mission closed");
        self.connection = ConnectionState::Closed(reason);
    }
}

/// Read-only copy of a mission's state for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSnapshot {
    pub id: Option<Uuid>,
    pub connection: ConnectionState,
    pub running: bool,
    pub steps: Vec<StepStatus>,
    pub records: Vec<LogRecord>,
    pub document: String,
    pub document_received: bool,
}

impl Default for MissionSnapshot {
    /// The state shown before any run: every stage pending, nothing logged.
    fn default() -> Self {
        Self {
            id: None,
            connection: ConnectionState::Idle,
            running: false,
            steps: crate::model::StepId::ALL
                .map(StepStatus::pending)
                .to_vec(),
            records: Vec::new(),
            document: String::new(),
            document_received: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::model::{ContentType, StepId, StepState};

    fn config(topic: &str) -> MissionConfig {
        MissionConfig {
            topic: topic.into(),
            content_type: ContentType::BlogPost,
            target_group: "General Audience".into(),
            language: "German".into(),
            region: "Germany".into(),
        }
    }

    fn open_mission() -> Mission {
        let mut mission = Mission::new(
            config("Sustainable Coffee"),
            classifier::ClassifierKind::Keywords.build(),
        );
        mission.open();
        mission
    }

    fn state(mission: &Mission, id: StepId) -> StepState {
        mission
            .steps()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.state)
            .unwrap()
    }

    #[test]
    fn new_mission_is_idle_and_empty() {
        let mission = Mission::new(config("x"), classifier::ClassifierKind::Keywords.build());
        assert_eq!(mission.connection(), ConnectionState::Idle);
        assert!(!mission.is_running());
        assert!(mission.records().is_empty());
        assert_eq!(mission.document(), "");
        assert_eq!(mission.config().topic, "x");
    }

    #[test]
    fn scenario_status_messages_drive_stages() {
        let mut mission = open_mission();

        mission.apply_raw(r#"{"type":"status","message":"Starting mission..."}"#);
        assert_eq!(mission.connection(), ConnectionState::Active);
        assert_eq!(state(&mission, StepId::Init), StepState::Running);

        mission.apply_raw(r#"{"type":"status","message":"Beginning research phase"}"#);
        assert_eq!(state(&mission, StepId::Init), StepState::Completed);
        assert_eq!(state(&mission, StepId::Research), StepState::Running);
        assert_eq!(mission.records().len(), 2);
    }

    #[test]
    fn scenario_operator_edit_survives_unrelated_data() {
        let mut mission = open_mission();

        mission.apply_raw(r##"{"type":"data","key":"briefing","report":"# Draft"}"##);
        assert_eq!(mission.document(), "# Draft");

        mission.edit_document("# Draft edited".into());
        mission.apply_raw(r#"{"type":"data","key":"keywords","data":["coffee","beans"]}"#);
        assert_eq!(mission.document(), "# Draft edited");
        assert!(mission.snapshot().document_received);
    }

    #[test]
    fn scenario_error_event_is_not_fatal() {
        let mut mission = open_mission();

        mission.apply_raw(r#"{"type":"error","message":"rate limited"}"#);
        assert!(mission.is_running());
        mission.apply_raw(r#"{"type":"status","message":"Evaluating content"}"#);

        assert!(mission.is_running());
        assert_eq!(state(&mission, StepId::Evaluation), StepState::Running);
        assert!(
            mission
                .records()
                .iter()
                .any(|r| r.kind == EventKind::Error && r.content == "rate limited")
        );
    }

    #[test]
    fn scenario_connection_lost_leaves_running_stage() {
        let mut mission = open_mission();
        mission.apply_raw(r#"{"type":"status","message":"Parsing 4 URLs..."}"#);

        mission.connection_lost();
        mission.connection_lost();

        let lost: Vec<&LogRecord> = mission
            .records()
            .iter()
            .filter(|r| r.content == log::CONNECTION_LOST)
            .collect();
        assert_eq!(lost.len(), 1);
        assert!(!mission.is_running());
        assert_eq!(
            mission.connection(),
            ConnectionState::Closed(CloseReason::ConnectionLost)
        );
        assert_eq!(state(&mission, StepId::Parsing), StepState::Running);
    }

    #[test]
    fn complete_finishes_and_freezes() {
        let mut mission = open_mission();
        mission.apply_raw(r#"{"type":"status","message":"Starting mission"}"#);
        mission.apply_raw(r#"{"type":"status","message":"Parsing"}"#);

        mission.apply_raw(r##"{"type":"complete","report":{"briefing":"# Final"}}"##);
        assert_eq!(mission.connection(), ConnectionState::Closed(CloseReason::Completed));
        assert_eq!(state(&mission, StepId::Parsing), StepState::Completed);
        assert_eq!(state(&mission, StepId::Research), StepState::Pending);
        assert_eq!(mission.records().last().unwrap().content, log::MISSION_COMPLETE);

        let frozen = mission.snapshot();
        mission.apply_raw(r#"{"type":"status","message":"Evaluating"}"#);
        mission.apply_raw(r#"{"type":"data","key":"briefing","data":"late"}"#);
        mission.connection_lost();
        assert_eq!(mission.snapshot(), frozen);
    }

    #[test]
    fn undecodable_messages_are_dropped_silently() {
        let mut mission = open_mission();
        mission.apply_raw("{not json");
        mission.apply_raw(r#""just a string""#);
        assert!(mission.records().is_empty());
        assert!(mission.is_running());
    }

    #[test]
    fn unrecognized_kind_is_logged_without_transition() {
        let mut mission = open_mission();
        mission.apply_raw(r#"{"type":"progress","message":"Starting mission"}"#);
        assert_eq!(mission.records()[0].content, "progress: Starting mission");
        assert!(mission.steps().iter().all(|s| s.state == StepState::Pending));
    }

    #[test]
    fn stop_closes_without_synthetic_record() {
        let mut mission = open_mission();
        mission.apply_raw(r#"{"type":"status","message":"Starting mission"}"#);
        mission.stop();

        assert_eq!(mission.connection(), ConnectionState::Closed(CloseReason::Stopped));
        assert_eq!(mission.records().len(), 1);
        assert_eq!(state(&mission, StepId::Init), StepState::Running);
    }

    #[test]
    fn edits_allowed_after_close() {
        let mut mission = open_mission();
        mission.apply_raw(r#"{"type":"complete"}"#);
        mission.edit_document("notes".into());
        assert_eq!(mission.document(), "notes");
    }

    #[test]
    fn default_snapshot_shows_pending_pipeline() {
        let snapshot = MissionSnapshot::default();
        assert_eq!(snapshot.steps.len(), 6);
        assert!(!snapshot.running);
        assert_eq!(snapshot.connection, ConnectionState::Idle);
    }
}
