//! Streaming: the push connection to the mission pipeline.
//!
//! [`transport`] turns an endpoint (or a recording) into a stream of raw
//! messages; [`controller`] owns the run that consumes it.

pub mod controller;
pub mod transport;

pub use controller::{MissionRun, StartError, StreamController};
