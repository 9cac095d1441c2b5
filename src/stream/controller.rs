//! Stream controller: owns one mission's connection and dispatch loop.
//!
//! Each run gets a dedicated task that exclusively owns the [`Mission`]. The
//! task consumes two queues, the transport stream and operator commands, and
//! publishes a [`MissionSnapshot`] after every change. Nothing else mutates
//! mission state.

use std::future::Future;

use futures::{Stream, StreamExt};
use url::Url;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::mission::classifier::ClassifierKind;
use crate::mission::{Mission, MissionSnapshot};
use crate::model::MissionConfig;

use super::transport::{self, TransportError};

/// Why a mission could not be started. No event is produced for these.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("a topic is required to start a mission")]
    MissingTopic,

    #[error("a mission is already running")]
    AlreadyRunning,
}

/// Operator commands delivered to the dispatch loop.
#[derive(Debug)]
enum Command {
    EditDocument(String),
    Stop,
}

/// Launches missions and keeps the most recent one.
pub struct StreamController {
    endpoint: Url,
    classifier: ClassifierKind,
    client: reqwest::Client,
    runtime: Handle,
    run: Option<MissionRun>,
}

impl StreamController {
    pub fn new(endpoint: Url, classifier: ClassifierKind, runtime: Handle) -> Self {
        Self {
            endpoint,
            classifier,
            client: reqwest::Client::new(),
            runtime,
            run: None,
        }
    }

    /// The current or most recent run.
    pub fn run(&self) -> Option<&MissionRun> {
        self.run.as_ref()
    }

    /// Whether a run is still receiving.
    pub fn is_running(&self) -> bool {
        self.run().is_some_and(MissionRun::is_running)
    }

    /// Whether a mission with `config` may start now.
    pub fn can_start(&self, config: &MissionConfig) -> bool {
        config.has_topic() && !self.is_running()
    }

    /// Start a live mission against the configured endpoint.
    pub fn start(&mut self, config: MissionConfig) -> Result<&MissionRun, StartError> {
        let url = config.stream_url(&self.endpoint);
        let client = self.client.clone();
        self.start_with(config, transport::connect(client, url))
    }

    /// Start a mission fed by a recorded stream instead of the network.
    pub fn replay(
        &mut self,
        config: MissionConfig,
        recording: String,
    ) -> Result<&MissionRun, StartError> {
        let source = std::future::ready(Ok(transport::replay(recording)));
        self.start_with(config, source)
    }

    /// Start a mission whose messages come from `source` once it resolves.
    ///
    /// The previous run, if any, is discarded along with its state.
    pub fn start_with<F, S>(
        &mut self,
        config: MissionConfig,
        source: F,
    ) -> Result<&MissionRun, StartError>
    where
        F: Future<Output = Result<S, TransportError>> + Send + 'static,
        S: Stream<Item = Result<String, TransportError>> + Send + Unpin + 'static,
    {
        if !config.has_topic() {
            return Err(StartError::MissingTopic);
        }
        if self.is_running() {
            return Err(StartError::AlreadyRunning);
        }

        let mission = Mission::new(config, self.classifier.build());
        let run = MissionRun::spawn(&self.runtime, mission, source);
        Ok(self.run.insert(run))
    }

    /// Stop the current run. No-op when nothing is running.
    pub fn stop(&self) {
        if let Some(run) = &self.run {
            run.stop();
        }
    }

    /// Replace the current run's document text.
    pub fn edit_document(&self, text: String) {
        if let Some(run) = &self.run {
            run.edit_document(text);
        }
    }

    /// Latest state of the current run, or the idle state before any run.
    pub fn snapshot(&self) -> MissionSnapshot {
        self.run
            .as_ref()
            .map(MissionRun::snapshot)
            .unwrap_or_default()
    }
}

/// Handle to one mission's dispatch task.
///
/// Dropping the handle ends the task once the stream has closed.
pub struct MissionRun {
    id: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<MissionSnapshot>,
    task: JoinHandle<()>,
}

impl MissionRun {
    fn spawn<F, S>(runtime: &Handle, mut mission: Mission, source: F) -> Self
    where
        F: Future<Output = Result<S, TransportError>> + Send + 'static,
        S: Stream<Item = Result<String, TransportError>> + Send + Unpin + 'static,
    {
        mission.open();
        let id = mission.id();
        let (snapshot_tx, snapshots) = watch::channel(mission.snapshot());
        let (commands, command_rx) = mpsc::unbounded_channel();

        let span = tracing::info_span!("mission", %id, topic = %mission.config().topic);
        let task =
            runtime.spawn(dispatch(mission, source, command_rx, snapshot_tx).instrument(span));

        Self {
            id,
            commands,
            snapshots,
            task,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<MissionSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_running(&self) -> bool {
        self.snapshots.borrow().running
    }

    pub fn stop(&self) {
        // The task may already be gone; nothing left to stop then.
        let _ = self.commands.send(Command::Stop);
    }

    pub fn edit_document(&self, text: String) {
        let _ = self.commands.send(Command::EditDocument(text));
    }

    /// Wait until the run is no longer receiving and return its final state.
    pub async fn closed(&self) -> MissionSnapshot {
        let mut snapshots = self.snapshots.clone();
        if let Ok(snapshot) = snapshots.wait_for(|s| !s.running).await {
            return MissionSnapshot::clone(&snapshot);
        }
        // The task is gone; its last snapshot is final.
        snapshots.borrow().clone()
    }
}

impl Drop for MissionRun {
    fn drop(&mut self) {
        if !self.task.is_finished() && self.is_running() {
            tracing::debug!(mission = %self.id, "dropping a live run");
            self.task.abort();
        }
    }
}

/// The dispatch loop. Sole owner of `mission` for the run's lifetime.
async fn dispatch<F, S>(
    mut mission: Mission,
    source: F,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<MissionSnapshot>,
) where
    F: Future<Output = Result<S, TransportError>>,
    S: Stream<Item = Result<String, TransportError>> + Unpin,
{
    let mut source = Box::pin(source);

    // Connecting. The operator may still edit or stop.
    let stream = loop {
        tokio::select! {
            biased;
            command = commands.recv() => {
                if !handle_command(&mut mission, command) {
                    break None;
                }
            }
            connected = &mut source => match connected {
                Ok(stream) => break Some(stream),
                Err(e) => {
                    tracing::warn!(error = %e, "could not open mission stream");
                    mission.connection_lost();
                    break None;
                }
            },
        }
        publish(&snapshots, &mission);
    };
    drop(source);
    publish(&snapshots, &mission);

    if let Some(mut stream) = stream {
        while mission.is_running() {
            tokio::select! {
                biased;
                command = commands.recv() => {
                    handle_command(&mut mission, command);
                }
                item = stream.next() => match item {
                    Some(Ok(raw)) => mission.apply_raw(&raw),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "mission stream failed");
                        mission.connection_lost();
                    }
                    None => {
                        tracing::warn!("mission stream ended before completion");
                        mission.connection_lost();
                    }
                },
            }
            publish(&snapshots, &mission);
        }
        // Dropping the stream releases the connection; anything still in flight is discarded.
    }

    // Closed. Keep serving document edits until the handle goes away.
    while let Some(command) = commands.recv().await {
        handle_command(&mut mission, Some(command));
        publish(&snapshots, &mission);
    }
    tracing::debug!("dispatch loop finished");
}

/// Apply an operator command. Returns false once the run should stop receiving.
fn handle_command(mission: &mut Mission, command: Option<Command>) -> bool {
    match command {
        Some(Command::EditDocument(text)) => {
            mission.edit_document(text);
            true
        }
        Some(Command::Stop) => {
            mission.stop();
            false
        }
        None => {
            mission.stop();
            false
        }
    }
}

fn publish(snapshots: &watch::Sender<MissionSnapshot>, mission: &Mission) {
    snapshots.send_replace(mission.snapshot());
}
