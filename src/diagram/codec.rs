//! Embedded diagram codec.
//!
//! A note stores at most one diagram as a block delimited by HTML comment
//! markers, so the block is invisible when the note is rendered:
//!
//! ```text
//! <!-- drawio:start -->
//! <mxfile>...</mxfile>
//! <!-- drawio:end -->
//! ```
//!
//! All functions are pure and total. A document without a well-formed block
//! simply has no diagram. Only the first well-formed block is ever matched;
//! payloads containing the marker literals are not supported.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::core::{DIAGRAM_END_MARKER, DIAGRAM_START_MARKER};

/// Start marker, the newline the formatting adds, the payload (lazily, so the
/// first end marker closes the block), the closing newline and end marker.
static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"{}\n((?s:.*?))\n{}",
        regex::escape(DIAGRAM_START_MARKER),
        regex::escape(DIAGRAM_END_MARKER),
    );
    Regex::new(&pattern).expect("block pattern is valid")
});

/// Location of the embedded block inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedBlock<'a> {
    /// Byte range of the whole block, markers included.
    pub span: Range<usize>,
    /// Payload between the markers (may be empty).
    pub payload: &'a str,
}

/// Find the first well-formed block.
pub fn locate(doc: &str) -> Option<EmbeddedBlock<'_>> {
    let captures = BLOCK.captures(doc)?;
    let whole = captures.get(0)?;
    let payload = captures.get(1)?;
    Some(EmbeddedBlock {
        span: whole.range(),
        payload: payload.as_str(),
    })
}

/// Render a payload as a complete block.
pub fn render_block(payload: &str) -> String {
    format!("{DIAGRAM_START_MARKER}\n{payload}\n{DIAGRAM_END_MARKER}")
}

/// Extract the embedded payload.
///
/// Returns `None` if there is no block or its payload is empty.
pub fn extract(doc: &str) -> Option<&str> {
    locate(doc)
        .map(|block| block.payload)
        .filter(|payload| !payload.is_empty())
}

/// Embed `payload`, replacing an existing block in place or appending a new
/// one after a blank line.
pub fn embed(doc: &str, payload: &str) -> String {
    let block = render_block(payload);

    if BLOCK.is_match(doc) {
        return BLOCK.replacen(doc, 1, NoExpand(&block)).into_owned();
    }

    let trimmed = doc.trim_end();
    if trimmed.is_empty() {
        block
    } else {
        format!("{trimmed}\n\n{block}")
    }
}

/// Delete the block (markers and payload) and trim trailing whitespace.
pub fn remove(doc: &str) -> String {
    BLOCK.replacen(doc, 1, "").trim_end().to_string()
}

/// Whether the document embeds a non-empty diagram.
pub fn has_embedded(doc: &str) -> bool {
    extract(doc).is_some()
}
