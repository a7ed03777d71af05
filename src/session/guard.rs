//! Navigation guard
//!
//! Leaving a page with unsaved changes needs the user's confirmation. The
//! target of a held-back navigation travels inside [`PendingLeave`] so the
//! host can finish it after the user picks "save and leave" or "discard".

use thiserror::Error;

use crate::autosave::AutoSaveError;
use crate::core::ChannelError;

/// Errors from a [`DocumentSession`](super::DocumentSession).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Saving or starting the autosave timer failed.
    #[error("autosave error: {0}")]
    AutoSave(#[from] AutoSaveError),

    /// Another save was still in flight, so this one did not run.
    #[error("another save is in flight")]
    SaveInFlight,

    /// The diagram channel could not be started.
    #[error("diagram channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// A navigation waiting for the user to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLeave<T> {
    target: T,
}

impl<T> PendingLeave<T> {
    pub(crate) fn new(target: T) -> Self {
        Self { target }
    }

    /// Where the user wanted to go.
    pub fn target(&self) -> &T {
        &self.target
    }

    pub(crate) fn into_target(self) -> T {
        self.target
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveDecision<T> {
    /// Nothing unsaved, navigate now.
    Proceed(T),
    /// Unsaved changes, ask the user first.
    Confirm(PendingLeave<T>),
}

impl<T> LeaveDecision<T> {
    /// Decide based on the document's dirty flag.
    pub fn for_dirty(dirty: bool, target: T) -> Self {
        if dirty {
            LeaveDecision::Confirm(PendingLeave::new(target))
        } else {
            LeaveDecision::Proceed(target)
        }
    }

    /// Whether the user has to be asked.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, LeaveDecision::Confirm(_))
    }
}

/// Save-and-leave did not go through. The user stays on the page.
#[derive(Debug, Error)]
#[error("leave blocked: {error}")]
pub struct LeaveBlocked<T> {
    /// The navigation that is still pending.
    pub pending: PendingLeave<T>,
    /// Why the save did not complete.
    #[source]
    pub error: SessionError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PersistError;

    #[test]
    fn test_decision_follows_dirty_flag() {
        assert_eq!(LeaveDecision::for_dirty(false, "/notes"), LeaveDecision::Proceed("/notes"));

        let decision = LeaveDecision::for_dirty(true, "/notes");
        assert!(decision.needs_confirmation());
        let LeaveDecision::Confirm(pending) = decision else {
            panic!("expected confirmation");
        };
        assert_eq!(pending.target(), &"/notes");
        assert_eq!(pending.into_target(), "/notes");
    }

    #[test]
    fn test_leave_blocked_display() {
        let blocked = LeaveBlocked {
            pending: PendingLeave::new("/notes"),
            error: SessionError::AutoSave(AutoSaveError::Persist(PersistError::Rejected(
                "quota".into(),
            ))),
        };
        assert_eq!(
            blocked.to_string(),
            "leave blocked: autosave error: save failed: storage rejected the update: quota"
        );
    }
}
