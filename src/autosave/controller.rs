//! Autosave controller
//!
//! Owns the dirtiness tracker, the save gate and the background timer for one
//! editing session. Manual saves and timer saves go through the same gate, so
//! at most one persist call is ever in flight. A save requested while another
//! is running is skipped, not queued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::config::AutoSaveConfig;
use super::state::{SaveOutcome, SaveState, SaveTrigger};
use super::timer::AutoSaveTimer;
use super::tracker::DirtyTracker;
use crate::core::{Draft, Persist, PersistError};

/// Errors from the autosave controller.
#[derive(Debug, Error)]
pub enum AutoSaveError {
    /// The persist function failed. The draft is still dirty.
    #[error("save failed: {0}")]
    Persist(#[from] PersistError),

    /// The timer was started outside a tokio runtime.
    #[error("no tokio runtime available for the autosave timer")]
    NoRuntime,

    /// The configured interval cannot drive a timer.
    #[error("autosave interval must be non-zero and within the timer range")]
    InvalidInterval,
}

/// State shared between the controller and its timer task.
pub(crate) struct Shared<P> {
    persist: P,
    tracker: Mutex<DirtyTracker>,
    status: broadcast::Sender<SaveState>,
}

impl<P: Persist> Shared<P> {
    fn new(persist: P, tracker: DirtyTracker, status_capacity: usize) -> Self {
        let (status, _) = broadcast::channel(status_capacity.max(1));
        Self {
            persist,
            tracker: Mutex::new(tracker),
            status,
        }
    }

    /// Lock the tracker. Never held across an `.await`.
    fn tracker(&self) -> MutexGuard<'_, DirtyTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: SaveState) {
        // No subscribers is fine.
        let _ = self.status.send(state);
    }

    /// Whether a timer tick should start a save.
    pub(crate) fn wants_autosave(&self) -> bool {
        self.tracker().wants_autosave()
    }

    /// Run one save attempt through the gate.
    pub(crate) async fn perform_save(&self, trigger: SaveTrigger) -> Result<SaveOutcome, AutoSaveError> {
        let pending = self.tracker().begin_save();
        let Some(pending) = pending else {
            trace!(?trigger, "save already in flight, skipping");
            return Ok(SaveOutcome::Skipped);
        };
        let gate = SaveGate {
            tracker: &self.tracker,
        };
        self.publish(SaveState::Saving);
        debug!(?trigger, bytes = pending.snapshot.len(), "persisting draft");

        let result = self.persist.persist(pending.draft).await;

        match result {
            Ok(()) => {
                self.tracker()
                    .record_success(pending.snapshot, Instant::now(), SystemTime::now());
                drop(gate);
                let state = self.tracker().state();
                debug!(?trigger, %state, "draft persisted");
                self.publish(state);
                Ok(SaveOutcome::Saved)
            }
            Err(error) => {
                warn!(?trigger, %error, "save failed, draft kept dirty");
                self.tracker().record_failure(error.clone());
                drop(gate);
                self.publish(SaveState::Error);
                let state = self.tracker().state();
                self.publish(state);
                Err(AutoSaveError::Persist(error))
            }
        }
    }
}

/// Releases the save gate when dropped, including when the save future is
/// dropped before the persist call resolves.
struct SaveGate<'a> {
    tracker: &'a Mutex<DirtyTracker>,
}

impl Drop for SaveGate<'_> {
    fn drop(&mut self) {
        self.tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release();
    }
}

/// Autosave controller for one editing session.
///
/// # Example
///
/// ```ignore
/// use notesync::prelude::*;
///
/// let persist = |draft: Draft| async move { api.update(&id, draft).await };
/// let mut autosave = AutoSaveController::new(persist, loaded, AutoSaveConfig::default());
/// autosave.start()?;
///
/// // On every edit
/// autosave.observe(Draft::new(title, body));
///
/// // Ctrl+S
/// autosave.save().await?;
/// ```
pub struct AutoSaveController<P: Persist> {
    shared: Arc<Shared<P>>,
    config: AutoSaveConfig,
    timer: Option<AutoSaveTimer>,
}

impl<P: Persist> AutoSaveController<P> {
    /// Create a controller. The timer is not running until [`start`](Self::start).
    pub fn new(persist: P, initial: Draft, config: AutoSaveConfig) -> Self {
        let tracker = if config.initially_dirty {
            DirtyTracker::unsaved(initial)
        } else {
            DirtyTracker::new(initial)
        };
        Self {
            shared: Arc::new(Shared::new(persist, tracker, config.status_capacity)),
            config,
            timer: None,
        }
    }

    /// Record the latest draft. No I/O happens here.
    pub fn observe(&self, draft: Draft) -> SaveState {
        let (before, after) = {
            let mut tracker = self.shared.tracker();
            let before = tracker.state();
            (before, tracker.observe(draft))
        };
        if before != after {
            trace!(%before, %after, "save state changed");
            self.shared.publish(after);
        }
        after
    }

    /// Treat the latest draft as persisted without any I/O.
    pub fn mark_saved(&self) {
        let changed = {
            let mut tracker = self.shared.tracker();
            let before = tracker.state();
            tracker.mark_saved();
            before != tracker.state()
        };
        if changed {
            self.shared.publish(self.state());
        }
    }

    /// Save the latest draft now and restart the timer period.
    ///
    /// Returns `Ok(SaveOutcome::Skipped)` without calling the persist function
    /// if a save is already in flight.
    pub async fn save(&self) -> Result<SaveOutcome, AutoSaveError> {
        let outcome = self.shared.perform_save(SaveTrigger::Manual).await;
        self.reset_timer();
        outcome
    }

    /// Start the background timer. No-op if already running.
    pub fn start(&mut self) -> Result<(), AutoSaveError> {
        if self.is_running() {
            return Ok(());
        }
        let timer = AutoSaveTimer::spawn(Arc::clone(&self.shared), self.config.interval)?;
        debug!(interval = ?self.config.interval, "autosave timer started");
        self.timer = Some(timer);
        Ok(())
    }

    /// Stop the background timer. A save already in flight still completes.
    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            debug!("autosave timer stopped");
        }
    }

    /// Start or stop the background timer.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), AutoSaveError> {
        self.config.enabled = enabled;
        if enabled {
            self.start()
        } else {
            self.stop();
            Ok(())
        }
    }

    /// Whether the background timer is running.
    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(AutoSaveTimer::is_running)
    }

    fn reset_timer(&self) {
        if let Some(timer) = &self.timer {
            timer.reset();
        }
    }

    /// Whether the latest draft differs from the last persisted one.
    ///
    /// Hosts use this to guard page close and in-app navigation.
    pub fn is_dirty(&self) -> bool {
        self.shared.tracker().is_dirty()
    }

    /// Whether a persist call is outstanding.
    pub fn is_saving(&self) -> bool {
        self.shared.tracker().is_saving()
    }

    /// Current save state.
    pub fn state(&self) -> SaveState {
        self.shared.tracker().state()
    }

    /// Latest observed draft.
    pub fn current(&self) -> Draft {
        self.shared.tracker().current().clone()
    }

    /// Completion time of the last successful save.
    pub fn last_saved_at(&self) -> Option<Instant> {
        self.shared.tracker().last_saved_at()
    }

    /// Wall-clock time of the last successful save, for "saved at" labels.
    pub fn last_saved_time(&self) -> Option<SystemTime> {
        self.shared.tracker().last_saved_time()
    }

    /// Error of the last failed save, cleared by the next success.
    pub fn last_error(&self) -> Option<PersistError> {
        self.shared.tracker().last_error().cloned()
    }

    /// Subscribe to save state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<SaveState> {
        self.shared.status.subscribe()
    }

    /// The controller configuration.
    pub fn config(&self) -> &AutoSaveConfig {
        &self.config
    }
}

impl<P: Persist> std::fmt::Debug for AutoSaveController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSaveController")
            .field("state", &self.state())
            .field("running", &self.is_running())
            .field("config", &self.config)
            .finish()
    }
}
