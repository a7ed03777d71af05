//! Dirtiness tracker
//!
//! Tracks the current draft against the last persisted snapshot and owns the
//! "save in progress" flag. Each controller keeps exactly one tracker.

use std::time::SystemTime;

use tokio::time::Instant;

use super::state::SaveState;
use crate::core::{Draft, DraftSnapshot, PersistError};

/// A save that has acquired the gate.
#[derive(Debug, Clone)]
pub struct PendingSave {
    /// Draft handed to the persist function.
    pub draft: Draft,
    /// Snapshot of that draft, recorded as persisted on success.
    pub snapshot: DraftSnapshot,
}

/// Dirtiness tracker state
///
/// - `current`: latest observed draft and its snapshot
/// - `persisted`: snapshot of the last successful save (`None` if the
///   initial content was never saved)
/// - `saving`: whether a persist call is outstanding
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    /// Latest observed draft
    current: Draft,
    /// Snapshot of `current`
    current_snapshot: DraftSnapshot,
    /// Snapshot of the last persisted draft
    persisted: Option<DraftSnapshot>,
    /// Save gate
    saving: bool,
    /// Completion time of the last successful save
    last_saved_at: Option<Instant>,
    /// Wall-clock time of the same save
    last_saved_time: Option<SystemTime>,
    /// Error of the last failed save, cleared on success
    last_error: Option<PersistError>,
}

impl DirtyTracker {
    /// Create a tracker whose initial draft counts as persisted.
    pub fn new(initial: Draft) -> Self {
        let snapshot = initial.snapshot();
        Self {
            current: initial,
            persisted: Some(snapshot.clone()),
            current_snapshot: snapshot,
            saving: false,
            last_saved_at: None,
            last_saved_time: None,
            last_error: None,
        }
    }

    /// Create a tracker whose initial draft has never been saved.
    pub fn unsaved(initial: Draft) -> Self {
        Self {
            persisted: None,
            ..Self::new(initial)
        }
    }

    /// Latest observed draft.
    pub fn current(&self) -> &Draft {
        &self.current
    }

    /// Snapshot of the latest observed draft.
    pub fn current_snapshot(&self) -> &DraftSnapshot {
        &self.current_snapshot
    }

    /// Snapshot of the last persisted draft.
    pub fn persisted_snapshot(&self) -> Option<&DraftSnapshot> {
        self.persisted.as_ref()
    }

    /// Whether the latest draft differs from the last persisted one.
    pub fn is_dirty(&self) -> bool {
        self.persisted.as_ref() != Some(&self.current_snapshot)
    }

    /// Whether a save holds the gate.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Current save state.
    pub fn state(&self) -> SaveState {
        if self.saving {
            SaveState::Saving
        } else if self.is_dirty() {
            SaveState::Dirty
        } else {
            SaveState::Clean
        }
    }

    /// Completion time of the last successful save.
    pub fn last_saved_at(&self) -> Option<Instant> {
        self.last_saved_at
    }

    /// Wall-clock time of the last successful save.
    pub fn last_saved_time(&self) -> Option<SystemTime> {
        self.last_saved_time
    }

    /// Error of the last failed save.
    pub fn last_error(&self) -> Option<&PersistError> {
        self.last_error.as_ref()
    }

    /// Record a new draft. Returns the resulting state.
    pub fn observe(&mut self, draft: Draft) -> SaveState {
        self.current_snapshot = draft.snapshot();
        self.current = draft;
        self.state()
    }

    /// Treat the latest draft as persisted without any I/O.
    pub fn mark_saved(&mut self) {
        self.persisted = Some(self.current_snapshot.clone());
    }

    /// Whether a background tick should start a save now.
    pub fn wants_autosave(&self) -> bool {
        !self.saving && self.is_dirty()
    }

    /// Acquire the gate and capture the draft to persist.
    ///
    /// Returns `None` if a save already holds the gate.
    pub fn begin_save(&mut self) -> Option<PendingSave> {
        if self.saving {
            return None;
        }
        self.saving = true;
        Some(PendingSave {
            draft: self.current.clone(),
            snapshot: self.current_snapshot.clone(),
        })
    }

    /// Record a successful save of `snapshot`.
    ///
    /// Edits observed while the save was in flight stay dirty.
    pub fn record_success(&mut self, snapshot: DraftSnapshot, at: Instant, wall: SystemTime) {
        self.persisted = Some(snapshot);
        self.last_saved_at = Some(at);
        self.last_saved_time = Some(wall);
        self.last_error = None;
    }

    /// Record a failed save. The persisted snapshot is left untouched.
    pub fn record_failure(&mut self, error: PersistError) {
        self.last_error = Some(error);
    }

    /// Release the gate.
    pub fn release(&mut self) {
        self.saving = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(content: &str) -> Draft {
        Draft::new("title", content)
    }

    #[test]
    fn test_new_tracker_is_clean() {
        let tracker = DirtyTracker::new(draft("a"));
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.state(), SaveState::Clean);
        assert!(tracker.last_saved_at().is_none());
    }

    #[test]
    fn test_unsaved_tracker_is_dirty() {
        let mut tracker = DirtyTracker::unsaved(draft("a"));
        assert!(tracker.is_dirty());
        assert!(tracker.persisted_snapshot().is_none());

        tracker.mark_saved();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_dirty_follows_latest_observation() {
        let mut tracker = DirtyTracker::new(draft("a"));

        assert_eq!(tracker.observe(draft("ab")), SaveState::Dirty);
        assert_eq!(tracker.observe(draft("abc")), SaveState::Dirty);

        // Typing back to the persisted text is clean again.
        assert_eq!(tracker.observe(draft("a")), SaveState::Clean);
    }

    #[test]
    fn test_gate_is_exclusive() {
        let mut tracker = DirtyTracker::new(draft("a"));
        tracker.observe(draft("b"));

        let pending = tracker.begin_save().unwrap();
        assert_eq!(pending.draft, draft("b"));
        assert_eq!(tracker.state(), SaveState::Saving);
        assert!(tracker.begin_save().is_none());
        assert!(!tracker.wants_autosave());

        tracker.release();
        assert!(tracker.begin_save().is_some());
    }

    #[test]
    fn test_edits_during_save_stay_dirty() {
        let mut tracker = DirtyTracker::new(draft("a"));
        tracker.observe(draft("b"));
        let pending = tracker.begin_save().unwrap();

        tracker.observe(draft("c"));
        tracker.record_success(pending.snapshot, Instant::now(), SystemTime::now());
        tracker.release();

        assert_eq!(tracker.state(), SaveState::Dirty);
        assert_eq!(tracker.persisted_snapshot(), Some(&draft("b").snapshot()));
    }

    #[test]
    fn test_failure_keeps_draft_dirty() {
        let mut tracker = DirtyTracker::new(draft("a"));
        tracker.observe(draft("b"));
        tracker.begin_save().unwrap();

        tracker.record_failure(PersistError::Unavailable("offline".into()));
        tracker.release();

        assert_eq!(tracker.state(), SaveState::Dirty);
        assert!(tracker.last_error().is_some());
        assert!(tracker.wants_autosave());

        let pending = tracker.begin_save().unwrap();
        tracker.record_success(pending.snapshot, Instant::now(), SystemTime::now());
        tracker.release();
        assert_eq!(tracker.state(), SaveState::Clean);
        assert!(tracker.last_error().is_none());
        assert!(tracker.last_saved_at().is_some());
    }

    #[test]
    fn test_success_records_wall_clock_time() {
        let mut tracker = DirtyTracker::new(draft("a"));
        assert!(tracker.last_saved_time().is_none());
        tracker.observe(draft("b"));

        let wall = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let pending = tracker.begin_save().unwrap();
        tracker.record_success(pending.snapshot, Instant::now(), wall);
        tracker.release();

        assert_eq!(tracker.last_saved_time(), Some(wall));
    }
}
