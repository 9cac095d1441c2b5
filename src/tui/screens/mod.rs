//! Screen rendering and input handling.

mod mission;
mod setup;

pub use mission::MissionScreen;
pub use setup::SetupScreen;
