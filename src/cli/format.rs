//! Output formatting for CLI display.

use crate::mission::{CloseReason, ConnectionState};
use crate::model::{LogRecord, StepState, StepStatus};

/// One log record as a line: `[HH:MM:SS] tag  content`.
pub(super) fn format_record(record: &LogRecord) -> String {
    format_record_at(record, &record.local_time())
}

fn format_record_at(record: &LogRecord, time: &str) -> String {
    format!("[{time}] {:<8} {}", record.kind.tag(), record.content)
}

/// The step tracker, one stage per line.
pub(super) fn format_steps(steps: &[StepStatus]) -> String {
    steps
        .iter()
        .map(|s| format!("  {} {}", state_marker(s.state), s.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn state_marker(state: StepState) -> &'static str {
    match state {
        StepState::Pending => "[ ]",
        StepState::Running => "[>]",
        StepState::Completed => "[x]",
        StepState::Error => "[!]",
    }
}

/// How the run ended, for the closing summary line.
pub(super) fn describe_connection(connection: ConnectionState) -> &'static str {
    match connection {
        ConnectionState::Idle => "not started",
        ConnectionState::Open | ConnectionState::Active => "still running",
        ConnectionState::Closed(CloseReason::Completed) => "completed",
        ConnectionState::Closed(CloseReason::ConnectionLost) => "connection lost",
        ConnectionState::Closed(CloseReason::Stopped) => "stopped",
    }
}
