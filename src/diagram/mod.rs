//! notesync - Diagram Embedding Protocol
//!
//! Implements:
//! - A pure codec storing one diagram payload inside the note text
//! - The JSON message format spoken by the embedded diagram editor
//! - A listener hub standing in for the host's global message bus
//! - The channel state machine driving the editor handshake

pub mod codec;
mod channel;
mod hub;
mod launch;
mod message;

pub use channel::*;
pub use hub::*;
pub use launch::*;
pub use message::*;
