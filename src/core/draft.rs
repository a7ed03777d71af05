//! Draft data model.
//!
//! A [`Draft`] holds every field the user can edit. Its [`DraftSnapshot`] is
//! the comparable serialized form used as the sole dirtiness signal: two
//! drafts are "the same" iff their snapshots are byte-equal.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// All user-editable fields of a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Note title.
    pub title: String,
    /// Note body, including any embedded diagram block.
    pub content: String,
}

impl Draft {
    /// Create a draft from a title and body.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Serialize this draft into its comparable snapshot.
    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot::of(self)
    }
}

/// Serialized, comparable form of a [`Draft`].
///
/// The serialization is a compact JSON object. Equality is plain byte
/// equality of that string; no field-by-field diffing happens anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftSnapshot(String);

impl DraftSnapshot {
    /// Serialize a draft.
    pub fn of(draft: &Draft) -> Self {
        let value = json!({
            "title": draft.title,
            "content": draft.content,
        });
        Self(value.to_string())
    }

    /// The serialized form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Size of the serialized form in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the serialized form is empty (never true for a real draft).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for DraftSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Draft> for DraftSnapshot {
    fn from(draft: &Draft) -> Self {
        Self::of(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_drafts_have_equal_snapshots() {
        let a = Draft::new("Groceries", "milk\neggs");
        let b = Draft::new("Groceries", "milk\neggs");
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        // Moving text between fields must change the snapshot.
        let a = Draft::new("ab", "c");
        let b = Draft::new("a", "bc");
        assert_ne!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_snapshot_is_json() {
        let snap = Draft::new("t", "say \"hi\"").snapshot();
        let value: serde_json::Value = serde_json::from_str(snap.as_str()).unwrap();
        assert_eq!(value["title"], "t");
        assert_eq!(value["content"], "say \"hi\"");
        assert!(!snap.is_empty());
    }
}
