//! notesync - Document Session
//!
//! Composition root for one note editing page:
//! - Title and body edits flow into the autosave controller
//! - Diagram editor saves are embedded into the body through the codec
//! - Navigation and page-close guards consult the dirty flag

mod document;
mod guard;

pub use document::*;
pub use guard::*;
