//! notesync - Core traits, types, and constants.
//!
//! This module provides the data model shared by the autosave controller and
//! the diagram protocol, the traits at the seams to the host application, and
//! the error types. It has no async runtime dependency.

mod constants;
mod draft;
mod error;
pub mod logging;
mod traits;

pub use constants::*;
pub use draft::*;
pub use error::*;
pub use traits::*;
