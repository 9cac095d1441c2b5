//! Transport: where raw messages come from.
//!
//! Live missions read Server-Sent Events over HTTP. Recorded missions replay
//! a file through the same SSE framing, or bare JSON lines.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::{fmt, fs};

use eventsource_stream::Eventsource;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::header::ACCEPT;
use url::Url;

/// A stream of raw message payloads.
pub type MessageStream = BoxStream<'static, Result<String, TransportError>>;

/// Connection-level failures. Any of these ends the run.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(reqwest::StatusCode),

    #[error("event stream broke: {0}")]
    Stream(String),

    #[error("failed to read {}: {source}", path.display())]
    Recording {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Open the mission stream at `url`.
pub async fn connect(client: reqwest::Client, url: Url) -> Result<MessageStream, TransportError> {
    tracing::info!(%url, "opening mission stream");
    let response = client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status));
    }

    Ok(sse_messages(response.bytes_stream()))
}

/// Frame `bytes` as Server-Sent Events and keep the mission messages.
///
/// Only unnamed (`message`) events with a non-empty data field are passed on.
fn sse_messages<S, B, E>(bytes: S) -> MessageStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    bytes
        .eventsource()
        .filter_map(|item| async move {
            match item {
                Ok(event) if is_message(&event.event) && !event.data.is_empty() => {
                    Some(Ok(event.data))
                }
                Ok(event) => {
                    tracing::debug!(event = %event.event, "skipping named or empty event");
                    None
                }
                Err(e) => Some(Err(TransportError::Stream(e.to_string()))),
            }
        })
        .boxed()
}

fn is_message(name: &str) -> bool {
    name.is_empty() || name == "message"
}

/// Load a recorded mission from `path`.
pub fn read_recording(path: &Path) -> Result<String, TransportError> {
    fs::read_to_string(path).map_err(|source| TransportError::Recording {
        path: path.to_path_buf(),
        source,
    })
}

/// Replay a recording as a message stream.
///
/// A recording with SSE fields is framed exactly like a live stream. One
/// without any is read as one JSON message per line.
pub fn replay(mut recording: String) -> MessageStream {
    if !has_sse_fields(&recording) {
        let messages: Vec<String> = recording
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('{'))
            .map(str::to_string)
            .collect();
        return stream::iter(messages.into_iter().map(Ok)).boxed();
    }

    // A final event is only dispatched once a blank line ends it.
    recording.push_str("\n\n");
    sse_messages(stream::iter([Ok::<_, Infallible>(recording)]))
}

fn has_sse_fields(text: &str) -> bool {
    const FIELDS: [&str; 4] = ["data:", "event:", "id:", "retry:"];
    text.lines()
        .any(|line| FIELDS.iter().any(|field| line.starts_with(field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn collect(recording: &str) -> Vec<String> {
        replay(recording.to_string())
            .map(Result::unwrap)
            .collect()
            .await
    }

    #[tokio::test]
    async fn recording_is_framed_like_a_live_stream() {
        let text = "\
: keep-alive
data: {\"type\":\"status\",\"message\":\"Starting mission\"}

event: ping
data: {\"type\":\"log\",\"message\":\"named\"}

data:{\"type\":\"log\",\"message\":\"no space\"}

data:

data: {\"type\":\"complete\"}";
        assert_eq!(
            collect(text).await,
            vec![
                r#"{"type":"status","message":"Starting mission"}"#.to_string(),
                r#"{"type":"log","message":"no space"}"#.to_string(),
                r#"{"type":"complete"}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn multi_line_data_is_joined() {
        let text = "data: {\"type\":\"status\",\ndata: \"message\":\"Starting mission\"}\n\n";
        assert_eq!(
            collect(text).await,
            vec!["{\"type\":\"status\",\n\"message\":\"Starting mission\"}".to_string()]
        );
    }

    #[tokio::test]
    async fn bare_json_lines_without_sse_fields() {
        let text = "{\"type\":\"log\",\"message\":\"one\"}\n\n  {\"type\":\"complete\"}\ngarbage\n";
        assert_eq!(
            collect(text).await,
            vec![
                r#"{"type":"log","message":"one"}"#.to_string(),
                r#"{"type":"complete"}"#.to_string(),
            ]
        );
    }

    #[test]
    fn reads_recording_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mission.sse");
        fs::write(&path, "data: {\"type\":\"complete\"}\n\n").unwrap();

        let recording = read_recording(&path).unwrap();
        assert_eq!(recording, "data: {\"type\":\"complete\"}\n\n");
    }

    #[test]
    fn missing_recording_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = read_recording(&dir.path().join("nope.sse")).unwrap_err();
        assert!(matches!(err, TransportError::Recording { .. }));
    }
}
