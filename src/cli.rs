//! CLI interface for genseo.
//!
//! Without a subcommand genseo opens the interactive console. The subcommands
//! run a mission headless: log records stream to stdout as they arrive, and
//! the final briefing goes to stdout or `--out`.
//!
//! - `genseo run --topic <topic>`: a live mission against the endpoint.
//! - `genseo replay <file>`: a recorded stream through the same dispatch path.

mod format;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::runtime::Runtime;
use tokio::sync::watch;

use crate::config::{Config, MissionDefaults};
use crate::mission::{CloseReason, ConnectionState, MissionSnapshot};
use crate::model::{ContentType, MissionConfig};
use crate::stream::{StreamController, transport};

use format::{describe_connection, format_record, format_steps};

/// genseo: watch a content-briefing pipeline work.
#[derive(Debug, Parser)]
#[command(name = "genseo", version, after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Mission stream endpoint. Overrides `GENSEO_ENDPOINT` and the config file.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Omit to open the interactive console.
    #[command(subcommand)]
    pub command: Option<Command>,
}

const USAGE_HELP: &str = r#"Examples:
  genseo
  genseo run --topic "Sustainable Coffee" --content-type landing-page
  genseo run --topic "Sustainable Coffee" --out briefing.md
  genseo replay mission.sse --json

Configuration lives in ~/.genseo/config.toml."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a live mission and print its log and briefing.
    Run {
        #[command(flatten)]
        mission: MissionArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Replay a recorded mission stream.
    ///
    /// The file holds SSE events as served live, or one JSON message per line.
    Replay {
        /// Recorded stream to replay.
        file: PathBuf,

        #[command(flatten)]
        mission: MissionArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Mission parameters. Unset values come from the config file defaults.
#[derive(Debug, Args)]
pub struct MissionArgs {
    /// Main keyword or topic.
    #[arg(long)]
    topic: Option<String>,

    #[arg(long, value_enum)]
    content_type: Option<ContentTypeArg>,

    #[arg(long)]
    target_group: Option<String>,

    #[arg(long)]
    language: Option<String>,

    #[arg(long)]
    region: Option<String>,
}

impl MissionArgs {
    fn to_config(&self, defaults: &MissionDefaults, fallback_topic: &str) -> MissionConfig {
        MissionConfig {
            topic: self
                .topic
                .clone()
                .unwrap_or_else(|| fallback_topic.to_string()),
            content_type: self
                .content_type
                .as_ref()
                .map_or(defaults.content_type, ContentTypeArg::to_domain),
            target_group: self
                .target_group
                .clone()
                .unwrap_or_else(|| defaults.target_group.clone()),
            language: self
                .language
                .clone()
                .unwrap_or_else(|| defaults.language.clone()),
            region: self
                .region
                .clone()
                .unwrap_or_else(|| defaults.region.clone()),
        }
    }
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Write the briefing to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the final mission state as JSON instead of the step summary.
    #[arg(long)]
    json: bool,
}

/// CLI-facing content type, mapped to the domain `ContentType`.
#[derive(Debug, Clone, ValueEnum)]
pub enum ContentTypeArg {
    BlogPost,
    LandingPage,
    ProductDescription,
    Whitepaper,
}

impl ContentTypeArg {
    fn to_domain(&self) -> ContentType {
        match self {
            Self::BlogPost => ContentType::BlogPost,
            Self::LandingPage => ContentType::LandingPage,
            Self::ProductDescription => ContentType::ProductDescription,
            Self::Whitepaper => ContentType::Whitepaper,
        }
    }
}

/// Run a headless command, returning an error message on failure.
pub fn run(
    command: Command,
    config: &Config,
    controller: &mut StreamController,
    runtime: &Runtime,
) -> Result<(), String> {
    match command {
        Command::Run { mission, output } => {
            let mission = mission.to_config(&config.defaults, "");
            let run = controller.start(mission).map_err(|e| e.to_string())?;
            tracing::info!(run = %run.id(), "mission started");
            let mut snapshots = run.subscribe();
            let snapshot = runtime.block_on(follow(&mut snapshots));
            finish(&snapshot, &output)
        }
        Command::Replay {
            file,
            mission,
            output,
        } => {
            let recording = transport::read_recording(&file).map_err(|e| e.to_string())?;
            let mission = mission.to_config(&config.defaults, &replay_topic(&file));
            let run = controller
                .replay(mission, recording)
                .map_err(|e| e.to_string())?;
            let mut snapshots = run.subscribe();
            let snapshot = runtime.block_on(follow(&mut snapshots));
            finish(&snapshot, &output)
        }
    }
}

/// Print new log records as they arrive until the run closes.
async fn follow(snapshots: &mut watch::Receiver<MissionSnapshot>) -> MissionSnapshot {
    let mut printed = 0;
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        for record in snapshot.records.iter().skip(printed) {
            println!("{}", format_record(record));
        }
        printed = snapshot.records.len();

        if !snapshot.running || snapshots.changed().await.is_err() {
            return snapshot;
        }
    }
}

fn finish(snapshot: &MissionSnapshot, output: &OutputArgs) -> Result<(), String> {
    if output.json {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| format!("failed to serialize mission: {e}"))?;
        println!("{json}");
    } else {
        eprintln!();
        eprintln!("{}", format_steps(&snapshot.steps));
    }

    if snapshot.document_received {
        write_briefing(&snapshot.document, output.out.as_deref())?;
    } else {
        eprintln!("No briefing received");
    }

    match snapshot.connection {
        ConnectionState::Closed(CloseReason::Completed) => Ok(()),
        other => Err(format!("mission ended: {}", describe_connection(other))),
    }
}

fn write_briefing(document: &str, out: Option<&Path>) -> Result<(), String> {
    match out {
        Some(path) => {
            fs::write(path, document)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Briefing → {}", path.display());
        }
        None => {
            println!();
            println!("{document}");
        }
    }
    Ok(())
}

/// A replay without `--topic` is named after its file.
fn replay_topic(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "replay".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::mission::classifier::ClassifierKind;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn no_subcommand_opens_the_console() {
        let cli = parse(&["genseo", "--endpoint", "http://pipeline.test/stream"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.endpoint.as_deref(), Some("http://pipeline.test/stream"));
    }

    #[test]
    fn run_flags_override_config_defaults() {
        let cli = parse(&[
            "genseo",
            "run",
            "--topic",
            "Sustainable Coffee",
            "--content-type",
            "landing-page",
            "--region",
            "Austria",
        ]);
        let Some(Command::Run { mission, .. }) = cli.command else {
            panic!("expected run");
        };

        let config = mission.to_config(&MissionDefaults::default(), "");
        assert_eq!(
            config,
            MissionConfig {
                topic: "Sustainable Coffee".into(),
                content_type: ContentType::LandingPage,
                target_group: "General Audience".into(),
                language: "German".into(),
                region: "Austria".into(),
            }
        );
    }

    #[test]
    fn replay_topic_defaults_to_file_stem() {
        let cli = parse(&["genseo", "replay", "runs/coffee.sse", "--json"]);
        let Some(Command::Replay {
            file,
            mission,
            output,
        }) = cli.command
        else {
            panic!("expected replay");
        };

        assert!(output.json);
        let config = mission.to_config(&MissionDefaults::default(), &replay_topic(&file));
        assert_eq!(config.topic, "coffee");
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        assert!(Cli::try_parse_from(["genseo", "run", "--content-type", "poem"]).is_err());
    }

    #[test]
    fn finish_reports_lost_connection() {
        let snapshot = MissionSnapshot {
            connection: ConnectionState::Closed(CloseReason::ConnectionLost),
            ..MissionSnapshot::default()
        };
        let output = OutputArgs {
            out: None,
            json: false,
        };
        let err = finish(&snapshot, &output).unwrap_err();
        assert!(err.contains("connection lost"));
    }

    #[test]
    fn finish_writes_briefing_to_out() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("briefing.md");
        let snapshot = MissionSnapshot {
            connection: ConnectionState::Closed(CloseReason::Completed),
            document: "# Final".into(),
            document_received: true,
            ..MissionSnapshot::default()
        };
        let output = OutputArgs {
            out: Some(path.clone()),
            json: false,
        };

        finish(&snapshot, &output).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Final");
    }

    #[tokio::test]
    async fn follow_returns_once_the_run_closes() {
        let runtime = tokio::runtime::Handle::current();
        let endpoint = url::Url::parse("http://unused.test/").unwrap();
        let mut controller = StreamController::new(endpoint, ClassifierKind::default(), runtime);

        let recording = "\
data: {\"type\":\"status\",\"message\":\"Starting mission\"}

event: ping
data: {}

data: {\"type\":\"complete\"}
"
        .to_string();
        let config = MissionDefaults::default();
        let mission = MissionArgs {
            topic: None,
            content_type: None,
            target_group: None,
            language: None,
            region: None,
        }
        .to_config(&config, "replay");

        let run = controller.replay(mission, recording).unwrap();
        let mut snapshots = run.subscribe();
        let snapshot = follow(&mut snapshots).await;

        assert!(!snapshot.running);
        assert_eq!(
            snapshot.connection,
            ConnectionState::Closed(CloseReason::Completed)
        );
        assert_eq!(snapshot.records.len(), 2);
    }
}
