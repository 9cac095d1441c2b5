//! Core data model for genseo.
//!
//! These types describe one mission as the console sees it:
//! the parameters it was launched with, the events the pipeline pushes back,
//! the stages those events are mapped onto, and the records shown to the operator.

mod event;
mod mission;
mod record;
mod step;

pub use event::{ClassifiedEvent, Content, EventKind};
pub use mission::{ContentType, MissionConfig};
pub use record::LogRecord;
pub use step::{StepId, StepState, StepStatus};
