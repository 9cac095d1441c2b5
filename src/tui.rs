//! Interactive mission console.

mod app;
mod screens;

pub use app::run;
