//! Save state and outcomes.

/// Where the current draft stands relative to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveState {
    /// Current draft equals the last persisted draft.
    Clean,
    /// Current draft differs and no save is in flight.
    Dirty,
    /// A persist call is outstanding.
    Saving,
    /// The last persist call failed.
    ///
    /// Only ever published on the status stream. The controller moves on to
    /// `Dirty` right after, so `state()` never rests here.
    Error,
}

impl SaveState {
    /// Short lowercase name, suitable for status indicators.
    pub fn as_str(self) -> &'static str {
        match self {
            SaveState::Clean => "clean",
            SaveState::Dirty => "dirty",
            SaveState::Saving => "saving",
            SaveState::Error => "error",
        }
    }
}

impl std::fmt::Display for SaveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a save attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The draft was persisted.
    Saved,
    /// Another save was in flight; nothing was persisted.
    Skipped,
}

/// What started a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// Explicit `save()` call.
    Manual,
    /// Background timer tick.
    Timer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(SaveState::Clean.to_string(), "clean");
        assert_eq!(SaveState::Saving.as_str(), "saving");
        assert_eq!(format!("{}", SaveState::Error), "error");
    }
}
