//! Listener hub
//!
//! Stands in for the host's global message bus: every message posted by an
//! editor context is fanned out to all registered listeners. Listeners are
//! RAII [`Subscription`]s and deregister themselves when dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::debug;

use super::message::{Envelope, RawMessage};
use crate::core::{ChannelError, EditorEndpoint, EndpointId};

#[derive(Default)]
struct Listeners {
    next_id: u64,
    senders: HashMap<u64, mpsc::UnboundedSender<Envelope>>,
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fan-out bus for messages coming from editor contexts.
#[derive(Clone, Default)]
pub struct MessageHub {
    listeners: Arc<Mutex<Listeners>>,
}

impl MessageHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut listeners = lock(&self.listeners);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.senders.insert(id, tx);
            id
        };
        debug!(listener = id, "listener registered");
        Subscription {
            rx,
            registration: Registration {
                id,
                listeners: Arc::downgrade(&self.listeners),
            },
        }
    }

    /// Deliver `envelope` to every listener. Returns the number reached.
    pub fn dispatch(&self, envelope: Envelope) -> usize {
        let mut listeners = lock(&self.listeners);
        listeners
            .senders
            .retain(|_, tx| tx.send(envelope.clone()).is_ok());
        listeners.senders.len()
    }

    /// Post a message on behalf of `source`.
    pub fn post(&self, source: EndpointId, data: impl Into<RawMessage>) -> usize {
        self.dispatch(Envelope::new(source, data))
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).senders.len()
    }
}

impl std::fmt::Debug for MessageHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A registered listener. Dropping it removes the registration.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Envelope>,
    registration: Registration,
}

impl Subscription {
    /// Listener ID within its hub.
    pub fn id(&self) -> u64 {
        self.registration.id
    }

    /// Wait for the next message. `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Take a message if one is queued.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Separate the registration from the receiving half, so the listener
    /// can be removed by whoever holds the [`Registration`] while the
    /// receiver lives in a task.
    pub fn split(self) -> (Registration, mpsc::UnboundedReceiver<Envelope>) {
        (self.registration, self.rx)
    }
}

/// Hub registration of a listener. Dropping it removes the listener at once.
#[derive(Debug)]
pub struct Registration {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Registration {
    /// Listener ID within its hub.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).senders.remove(&self.id);
            debug!(listener = self.id, "listener deregistered");
        }
    }
}

/// [`EditorEndpoint`] over a tokio channel; the receiving half plays the
/// editor's inbox.
#[derive(Debug, Clone)]
pub struct PortEndpoint {
    id: EndpointId,
    tx: mpsc::UnboundedSender<String>,
}

impl PortEndpoint {
    /// Create an endpoint and the inbox receiving what the host posts.
    pub fn pair(id: EndpointId) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }
}

impl EditorEndpoint for PortEndpoint {
    fn id(&self) -> EndpointId {
        self.id
    }

    fn post(&self, message: String) -> Result<(), ChannelError> {
        self.tx
            .send(message)
            .map_err(|_| ChannelError::EndpointClosed(self.id.get()))
    }
}
