//! Document session

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info};

use super::guard::{LeaveBlocked, LeaveDecision, PendingLeave, SessionError};
use crate::autosave::{AutoSaveConfig, AutoSaveController, SaveOutcome, SaveState};
use crate::core::{Draft, EditorEndpoint, EndpointId, Persist, PersistError};
use crate::diagram::{ChannelTask, DiagramChannel, DiagramEvent, EditorLaunch, MessageHub, codec};

/// A note as loaded from storage. Missing fields load as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Storage ID.
    pub id: String,
    /// Stored title.
    #[serde(default)]
    pub title: Option<String>,
    /// Stored body.
    #[serde(default)]
    pub content: Option<String>,
}

type Endpoint = Box<dyn EditorEndpoint>;
type EventSender = mpsc::UnboundedSender<DiagramEvent>;

/// An open diagram editor attached to the session.
struct OpenDiagram {
    endpoint: EndpointId,
    events: mpsc::UnboundedReceiver<DiagramEvent>,
    task: ChannelTask<Endpoint, EventSender>,
}

/// Editing session for one note.
///
/// Owns the editable fields, the autosave controller and, while the diagram
/// editor is open, its channel.
///
/// # Example
///
/// ```ignore
/// let mut session = DocumentSession::open(note, persist, AutoSaveConfig::default())?;
/// session.set_body("# Groceries");
///
/// match session.request_leave("/notes") {
///     LeaveDecision::Proceed(target) => navigate(target),
///     LeaveDecision::Confirm(pending) => ask_user(pending),
/// }
/// ```
pub struct DocumentSession<P: Persist> {
    note_id: String,
    title: String,
    body: String,
    autosave: AutoSaveController<P>,
    diagram: Option<OpenDiagram>,
}

impl<P: Persist> DocumentSession<P> {
    /// Start editing `note`. Starts the autosave timer when enabled, which
    /// needs a tokio runtime.
    pub fn open(note: NoteRecord, persist: P, config: AutoSaveConfig) -> Result<Self, SessionError> {
        let title = note.title.unwrap_or_default();
        let body = note.content.unwrap_or_default();
        let enabled = config.enabled;
        let mut autosave = AutoSaveController::new(persist, Draft::new(title.clone(), body.clone()), config);
        if enabled {
            autosave.start()?;
        }
        debug!(note = %note.id, "document session opened");
        Ok(Self {
            note_id: note.id,
            title,
            body,
            autosave,
            diagram: None,
        })
    }

    /// Storage ID of the note.
    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    /// Current title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Current editable fields.
    pub fn draft(&self) -> Draft {
        Draft::new(self.title.clone(), self.body.clone())
    }

    /// Replace the title.
    pub fn set_title(&mut self, title: impl Into<String>) -> SaveState {
        self.title = title.into();
        self.observe()
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<String>) -> SaveState {
        self.body = body.into();
        self.observe()
    }

    fn observe(&self) -> SaveState {
        self.autosave.observe(self.draft())
    }

    // Diagram

    /// Payload of the diagram embedded in the body, if any.
    pub fn diagram_xml(&self) -> Option<&str> {
        codec::extract(&self.body)
    }

    /// Embed `xml` into the body, replacing any existing diagram.
    pub fn apply_diagram(&mut self, xml: &str) -> SaveState {
        self.body = codec::embed(&self.body, xml);
        self.observe()
    }

    /// Remove the embedded diagram. Returns `false` if there was none.
    pub fn remove_diagram(&mut self) -> bool {
        if codec::locate(&self.body).is_none() {
            return false;
        }
        self.body = codec::remove(&self.body);
        self.observe();
        true
    }

    /// Open the diagram editor on `endpoint`, seeded with the embedded
    /// payload (blank if none). Returns the URL the host loads in the
    /// editor's context.
    ///
    /// An editor that is already open is torn down first, applying any
    /// save it already delivered.
    pub fn open_diagram<E>(&mut self, hub: &MessageHub, endpoint: E, launch: &EditorLaunch) -> Result<String, SessionError>
    where
        E: EditorEndpoint + 'static,
    {
        self.close_diagram();

        let endpoint_id = endpoint.id();
        let (events_tx, events) = mpsc::unbounded_channel();
        let xml = self.diagram_xml().unwrap_or_default().to_owned();
        let channel = DiagramChannel::new(Box::new(endpoint) as Endpoint, events_tx, xml)
            .with_autosave(launch.autosave);
        let task = channel.spawn(hub.subscribe())?;

        info!(note = %self.note_id, endpoint = %endpoint_id, "diagram editor opening");
        self.diagram = Some(OpenDiagram {
            endpoint: endpoint_id,
            events,
            task,
        });
        Ok(launch.url())
    }

    /// Whether a diagram editor is attached.
    pub fn is_diagram_open(&self) -> bool {
        self.diagram.is_some()
    }

    /// Endpoint of the attached diagram editor.
    pub fn diagram_endpoint(&self) -> Option<EndpointId> {
        self.diagram.as_ref().map(|open| open.endpoint)
    }

    /// Apply every queued diagram event without waiting. Returns how many
    /// were applied.
    pub fn pump_diagram(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(open) = self.diagram.as_mut() else {
                break;
            };
            match open.events.try_recv() {
                Ok(event) => {
                    self.apply_event(&event);
                    applied += 1;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.close_diagram();
                    break;
                }
            }
        }
        applied
    }

    /// Wait for the next diagram event and apply it.
    ///
    /// `None` when no editor is attached or the channel stopped.
    pub async fn next_diagram_event(&mut self) -> Option<DiagramEvent> {
        let event = self.diagram.as_mut()?.events.recv().await;
        match event {
            Some(event) => {
                self.apply_event(&event);
                Some(event)
            }
            None => {
                self.close_diagram();
                None
            }
        }
    }

    fn apply_event(&mut self, event: &DiagramEvent) {
        match event {
            DiagramEvent::Saved(xml) => {
                self.apply_diagram(xml);
            }
            DiagramEvent::Exited => {
                self.close_diagram();
            }
        }
    }

    /// Detach the editor. Saves the channel already accepted are applied,
    /// and the hub listener is gone when this returns.
    fn close_diagram(&mut self) -> usize {
        let Some(OpenDiagram {
            endpoint,
            mut events,
            task,
        }) = self.diagram.take()
        else {
            return 0;
        };
        // Nothing is accepted once the task is gone.
        drop(task);
        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            if let DiagramEvent::Saved(xml) = event {
                self.apply_diagram(&xml);
                applied += 1;
            }
        }
        debug!(%endpoint, applied, "diagram editor detached");
        applied
    }

    // Saving

    /// Apply pending diagram saves, then save now. Skipped if a save is
    /// already in flight.
    pub async fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        self.pump_diagram();
        Ok(self.autosave.save().await?)
    }

    /// Current save state.
    pub fn save_state(&self) -> SaveState {
        self.autosave.state()
    }

    /// Whether there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    /// Completion time of the last successful save.
    pub fn last_saved_at(&self) -> Option<Instant> {
        self.autosave.last_saved_at()
    }

    /// Wall-clock time of the last successful save, for "saved at" labels.
    pub fn last_saved_time(&self) -> Option<SystemTime> {
        self.autosave.last_saved_time()
    }

    /// Error of the last failed save.
    pub fn last_error(&self) -> Option<PersistError> {
        self.autosave.last_error()
    }

    /// Subscribe to save state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<SaveState> {
        self.autosave.subscribe()
    }

    /// The autosave controller.
    pub fn autosave(&self) -> &AutoSaveController<P> {
        &self.autosave
    }

    /// Enable or disable background saves.
    pub fn set_autosave_enabled(&mut self, enabled: bool) -> Result<(), SessionError> {
        Ok(self.autosave.set_enabled(enabled)?)
    }

    // Navigation guard

    /// Ask to navigate to `target`. Pending diagram saves count as
    /// unsaved changes.
    pub fn request_leave<T>(&mut self, target: T) -> LeaveDecision<T> {
        self.pump_diagram();
        LeaveDecision::for_dirty(self.is_dirty(), target)
    }

    /// Save, then release the pending navigation.
    ///
    /// If the save fails or another save is in flight the user stays on
    /// the page and gets the pending navigation back.
    pub async fn save_and_leave<T>(&mut self, pending: PendingLeave<T>) -> Result<T, LeaveBlocked<T>> {
        self.pump_diagram();
        let error = match self.autosave.save().await {
            Ok(SaveOutcome::Saved) => return Ok(pending.into_target()),
            Ok(SaveOutcome::Skipped) => SessionError::SaveInFlight,
            Err(error) => SessionError::AutoSave(error),
        };
        debug!(%error, "save before leaving did not complete");
        Err(LeaveBlocked { pending, error })
    }

    /// Drop unsaved changes and release the pending navigation.
    pub fn discard<T>(&self, pending: PendingLeave<T>) -> T {
        debug!(note = %self.note_id, "leaving with unsaved changes discarded");
        pending.into_target()
    }

    /// Whether closing the page should prompt the user.
    pub fn should_block_unload(&mut self) -> bool {
        self.pump_diagram();
        self.is_dirty()
    }

    /// End the session: detach the diagram editor, keeping saves it
    /// already delivered, and stop the timer. Returns the final draft.
    pub fn close(mut self) -> Draft {
        self.close_diagram();
        self.autosave.stop();
        debug!(note = %self.note_id, dirty = self.is_dirty(), "document session closed");
        self.draft()
    }
}

impl<P: Persist> std::fmt::Debug for DocumentSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("note_id", &self.note_id)
            .field("autosave", &self.autosave)
            .field("diagram", &self.diagram_endpoint())
            .finish()
    }
}
