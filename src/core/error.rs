//! Error types for notesync.

use thiserror::Error;

/// Errors reported by the persist function supplied by the host.
///
/// The controller never treats these as fatal: the draft stays dirty and the
/// next timer tick or manual save retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// Storage could not be reached (network, backend down).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Storage refused the update.
    #[error("storage rejected the update: {0}")]
    Rejected(String),

    /// The note being saved no longer exists.
    #[error("note not found: {0}")]
    NotFound(String),
}

/// Errors decoding a message received from the diagram editor.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Payload is not valid JSON or does not carry a recognized event.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Event requires a payload but carried an empty one.
    #[error("event {0} carried an empty payload")]
    EmptyPayload(&'static str),
}

/// Errors sending to the diagram editor.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The editor endpoint has gone away.
    #[error("editor endpoint {0} closed")]
    EndpointClosed(u64),

    /// Outgoing action could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The channel task was spawned outside a tokio runtime.
    #[error("no tokio runtime available for the diagram channel")]
    NoRuntime,
}

/// Top-level notesync errors.
#[derive(Debug, Error)]
pub enum NotesyncError {
    /// Persist error.
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),

    /// Message error.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    /// Channel error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
