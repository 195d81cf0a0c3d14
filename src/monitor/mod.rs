//! Poll loop and session lifecycle tracking.

mod runner;
mod tracker;

pub use runner::Monitor;
pub use tracker::{GameTracker, SessionEvent};
