//! Constants shared across the crate.
//!
//! The marker literals are part of the persisted document and
//! the editor protocol. Changing them breaks existing notes.

use std::time::Duration;

// =============================================================================
// AUTOSAVE
// =============================================================================

/// Default interval between background autosave attempts.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_millis(10_000);

/// Default capacity of the save status broadcast stream.
pub const DEFAULT_STATUS_CAPACITY: usize = 16;

// =============================================================================
// EMBEDDED DIAGRAM MARKERS
// =============================================================================

/// Start marker of the embedded diagram block.
pub const DIAGRAM_START_MARKER: &str = "<!-- drawio:start -->";

/// End marker of the embedded diagram block.
pub const DIAGRAM_END_MARKER: &str = "<!-- drawio:end -->";

// =============================================================================
// EMBEDDED EDITOR
// =============================================================================

/// Default path the embedded editor is served from.
pub const DEFAULT_EDITOR_PATH: &str = "/drawio/index.html";
