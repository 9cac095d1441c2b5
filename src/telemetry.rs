//! Diagnostic logging.
//!
//! Headless commands log to stderr. The TUI owns the terminal, so it logs to
//! `~/.genseo/genseo.log` instead. Operator-facing mission records never go
//! through here; they live in the mission log.

use std::{env, fs, io};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

const LOG_FILE: &str = "genseo.log";
const DEFAULT_LEVEL: &str = "warn";

/// Log to stderr.
pub fn init_stderr() {
    tracing_subscriber::registry()
        .with(log_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Log to `~/.genseo/genseo.log`.
///
/// The returned guard flushes pending lines when dropped; hold it until exit.
/// Without a home directory, logging is disabled.
pub fn init_file() -> Option<WorkerGuard> {
    let dir = Config::home()?;
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("Warning: cannot create {}: {e}", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(log_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}

/// `GENSEO_LOG`, then `RUST_LOG`, then `warn`. An unparsable directive falls
/// back to `warn`.
fn log_filter() -> EnvFilter {
    let genseo = env::var("GENSEO_LOG").ok();
    let rust = env::var("RUST_LOG").ok();
    let directive = filter_directive(genseo.as_deref(), rust.as_deref());
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

fn filter_directive<'a>(genseo: Option<&'a str>, rust: Option<&'a str>) -> &'a str {
    genseo
        .filter(|v| !v.is_empty())
        .or(rust.filter(|v| !v.is_empty()))
        .unwrap_or(DEFAULT_LEVEL)
}
