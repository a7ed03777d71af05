//! # notesync
//!
//! Autosave synchronization and embedded diagram protocol for note editors.
//!
//! notesync keeps a text document (a "note") and an optional embedded vector
//! diagram in sync with storage while the user edits it. It provides:
//!
//! - **Autosave**: dirtiness by snapshot equality, periodic background saves,
//!   at most one persist call in flight
//! - **Diagram protocol**: handshake with a foreign diagram editor reached
//!   only through asynchronous messages, filtered by origin
//! - **Embedding**: a textual marker format storing one diagram inside the note
//! - **Session**: a composition root with navigation and page-close guards
//!
//! ## Feature Flags
//!
//! - `autosave` (default): Autosave controller and background timer
//! - `diagram` (default): Codec, message format, listener hub, editor channel
//! - `session` (default): Document session (requires `autosave` and `diagram`)
//!
//! ## Modules
//!
//! - [`core`]: Data model, seam traits, constants, errors, logging (always included)
//! - [`autosave`]: Autosave layer (requires `autosave` feature)
//! - [`diagram`]: Diagram embedding protocol (requires `diagram` feature)
//! - [`session`]: Document session (requires `session` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! # #[cfg(feature = "diagram")]
//! # {
//! use notesync::diagram::codec;
//!
//! let note = codec::embed("# Floor plan", "<mxfile/>");
//! assert_eq!(
//!     note,
//!     "# Floor plan\n\n<!-- drawio:start -->\n<mxfile/>\n<!-- drawio:end -->"
//! );
//! assert_eq!(codec::extract(&note), Some("<mxfile/>"));
//! assert_eq!(codec::remove(&note), "# Floor plan");
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Autosave layer (feature-gated)
#[cfg(feature = "autosave")]
#[cfg_attr(docsrs, doc(cfg(feature = "autosave")))]
pub mod autosave;

// Diagram protocol (feature-gated)
#[cfg(feature = "diagram")]
#[cfg_attr(docsrs, doc(cfg(feature = "diagram")))]
pub mod diagram;

// Document session (feature-gated)
#[cfg(feature = "session")]
#[cfg_attr(docsrs, doc(cfg(feature = "session")))]
pub mod session;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core traits and types
    pub use crate::core::*;

    #[cfg(feature = "autosave")]
    pub use crate::autosave::{
        AutoSaveConfig, AutoSaveConfigBuilder, AutoSaveController, AutoSaveError, SaveOutcome,
        SaveState,
    };

    #[cfg(feature = "diagram")]
    pub use crate::diagram::{
        ChannelState, DarkMode, DiagramChannel, DiagramEvent, DiagramHandler, EditorEvent,
        EditorLaunch, Envelope, HostAction, MessageHub, PortEndpoint, RawMessage, Subscription,
        codec,
    };

    #[cfg(feature = "session")]
    pub use crate::session::{
        DocumentSession, LeaveBlocked, LeaveDecision, NoteRecord, PendingLeave, SessionError,
    };
}

// Re-export commonly used items at crate root
pub use crate::core::{Draft, DraftSnapshot, EditorEndpoint, EndpointId, NotesyncError, Persist, PersistError};

#[cfg(feature = "autosave")]
pub use crate::autosave::{AutoSaveConfig, AutoSaveController, SaveState};

#[cfg(feature = "session")]
pub use crate::session::{DocumentSession, NoteRecord};
