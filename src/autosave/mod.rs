//! notesync - Autosave Layer
//!
//! Implements:
//! - Dirtiness tracking by snapshot equality
//! - Periodic background saves using the draft at fire time
//! - At most one persist call in flight (manual and timer saves share a gate)
//! - Failure recovery: a failed save leaves the draft dirty for the next attempt

mod config;
mod controller;
mod state;
#[cfg(test)]
pub(crate) mod testing;
mod timer;
mod tracker;

pub use config::*;
pub use controller::*;
pub use state::*;
pub use timer::*;
pub use tracker::*;
