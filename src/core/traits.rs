//! Core traits for notesync.
//!
//! These traits are the seams to the host application: where drafts are
//! stored and how messages reach the embedded diagram editor.

use std::future::Future;

use super::draft::Draft;
use super::error::{ChannelError, PersistError};

/// Stores a draft. Supplied by the host application.
///
/// The whole document is replaced on every call (no patching), so calls MUST
/// be safe to repeat with identical arguments.
///
/// Any `Fn(Draft) -> impl Future<Output = Result<(), PersistError>>` closure
/// implements this trait:
///
/// ```ignore
/// let persist = |draft: Draft| async move {
///     api.update_note(&note_id, &draft.title, &draft.content).await
/// };
/// ```
pub trait Persist: Send + Sync + 'static {
    /// Store `draft`, resolving once storage has acknowledged it.
    fn persist(&self, draft: Draft) -> impl Future<Output = Result<(), PersistError>> + Send;
}

impl<F, Fut> Persist for F
where
    F: Fn(Draft) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PersistError>> + Send,
{
    fn persist(&self, draft: Draft) -> impl Future<Output = Result<(), PersistError>> + Send {
        self(draft)
    }
}

/// Identity of a message endpoint (the editor's isolated context).
///
/// Incoming messages are only honoured when their source matches the
/// endpoint a channel was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(u64);

impl EndpointId {
    /// Create an endpoint ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "endpoint#{}", self.0)
    }
}

impl From<u64> for EndpointId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Host -> editor half of the transport.
///
/// Delivery is asynchronous and one-directional; `post` only hands the
/// message over and never waits for the editor to react.
pub trait EditorEndpoint: Send {
    /// Identity used to filter incoming messages.
    fn id(&self) -> EndpointId;

    /// Post a serialized message to the editor.
    fn post(&self, message: String) -> Result<(), ChannelError>;
}

impl<E: EditorEndpoint + ?Sized> EditorEndpoint for Box<E> {
    fn id(&self) -> EndpointId {
        (**self).id()
    }

    fn post(&self, message: String) -> Result<(), ChannelError> {
        (**self).post(message)
    }
}
