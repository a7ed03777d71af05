//! Diagram channel
//!
//! Drives the handshake with one embedded editor:
//!
//! ```text
//! Uninitialized --init--> Ready --save/autosave--> Ready
//!                           |  \--init (reload)--> Ready (load re-sent)
//!                           \--exit--> Exited
//! ```
//!
//! Messages from other endpoints, anything that fails to decode, and
//! commands arriving before `init` are dropped.

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::hub::{Registration, Subscription};
use super::message::{EditorEvent, Envelope, HostAction};
use crate::core::{ChannelError, EditorEndpoint, EndpointId};

/// Handshake state of a [`DiagramChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Waiting for the editor's `init`.
    Uninitialized,
    /// Diagram loaded, saves are accepted.
    Ready,
    /// The editor closed. Terminal.
    Exited,
}

/// Event forwarded to the owner of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramEvent {
    /// The editor produced a new payload.
    Saved(String),
    /// The editor closed.
    Exited,
}

/// Receives the editor's save and exit notifications.
///
/// Implementations only update in-memory state; persistence is the
/// autosave controller's job.
pub trait DiagramHandler: Send {
    /// A non-empty payload was saved (manually or by the editor's autosave).
    fn on_save(&mut self, xml: &str);

    /// The editor closed. Called at most once.
    fn on_exit(&mut self);
}

impl DiagramHandler for mpsc::UnboundedSender<DiagramEvent> {
    fn on_save(&mut self, xml: &str) {
        // Receiver gone means nobody cares any more.
        let _ = self.send(DiagramEvent::Saved(xml.to_owned()));
    }

    fn on_exit(&mut self) {
        let _ = self.send(DiagramEvent::Exited);
    }
}

/// What [`DiagramChannel::handle`] did with an accepted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A `load` was sent to the editor.
    Loaded,
    /// The payload cache was updated and the handler notified.
    Saved,
    /// The editor exited.
    Exited,
}

/// Channel to one embedded diagram editor.
pub struct DiagramChannel<E, H> {
    endpoint: E,
    handler: H,
    state: ChannelState,
    xml: String,
    autosave: bool,
}

impl<E: EditorEndpoint, H: DiagramHandler> DiagramChannel<E, H> {
    /// Create a channel that will load `xml` (empty for a blank diagram).
    pub fn new(endpoint: E, handler: H, xml: impl Into<String>) -> Self {
        Self {
            endpoint,
            handler,
            state: ChannelState::Uninitialized,
            xml: xml.into(),
            autosave: true,
        }
    }

    /// Whether the `load` action asks the editor for autosave events.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Replace the cached payload. Sent on the next `init`.
    pub fn set_xml(&mut self, xml: impl Into<String>) {
        self.xml = xml.into();
    }

    /// Cached payload.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Handshake state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Endpoint this channel listens to.
    pub fn endpoint_id(&self) -> EndpointId {
        self.endpoint.id()
    }

    /// Process one message from the bus.
    ///
    /// Returns `None` when the message was discarded.
    pub fn handle(&mut self, envelope: &Envelope) -> Option<Dispatch> {
        let expected = self.endpoint.id();
        if envelope.source != Some(expected) {
            trace!(source = ?envelope.source, %expected, "discarding message from foreign source");
            return None;
        }
        if self.state == ChannelState::Exited {
            trace!("discarding message after exit");
            return None;
        }
        let event = match EditorEvent::parse(&envelope.data) {
            Ok(event) => event,
            Err(error) => {
                trace!(%error, "discarding undecodable message");
                return None;
            }
        };

        match (self.state, event) {
            (_, EditorEvent::Init) => {
                let reload = self.state == ChannelState::Ready;
                self.state = ChannelState::Ready;
                info!(endpoint = %expected, reload, "diagram editor ready");
                match self.send_load() {
                    Ok(()) => Some(Dispatch::Loaded),
                    Err(error) => {
                        debug!(%error, "failed to send load");
                        None
                    }
                }
            }
            (ChannelState::Ready, EditorEvent::Save { xml } | EditorEvent::Autosave { xml }) => {
                self.xml = xml;
                self.handler.on_save(&self.xml);
                Some(Dispatch::Saved)
            }
            (ChannelState::Ready, EditorEvent::Exit) => {
                self.state = ChannelState::Exited;
                info!(endpoint = %expected, "diagram editor exited");
                self.handler.on_exit();
                Some(Dispatch::Exited)
            }
            (state, event) => {
                trace!(?state, event = event.name(), "discarding event before init");
                None
            }
        }
    }

    fn send_load(&self) -> Result<(), ChannelError> {
        let load = HostAction::load(self.xml.clone(), self.autosave).encode()?;
        self.endpoint.post(load)
    }

    /// Handle messages until the editor exits or the hub goes away.
    ///
    /// The subscription is dropped, and so deregistered, on return.
    pub async fn run(self, subscription: Subscription) -> Self {
        let (registration, messages) = subscription.split();
        let channel = self.drive(messages).await;
        drop(registration);
        channel
    }

    async fn drive(mut self, mut messages: mpsc::UnboundedReceiver<Envelope>) -> Self {
        while let Some(envelope) = messages.recv().await {
            if self.handle(&envelope) == Some(Dispatch::Exited) {
                break;
            }
        }
        self
    }
}

impl<E, H> DiagramChannel<E, H>
where
    E: EditorEndpoint + 'static,
    H: DiagramHandler + 'static,
{
    /// Run the channel on the current tokio runtime.
    ///
    /// The hub registration stays with the returned [`ChannelTask`], so
    /// dropping the task removes the listener before `drop` returns.
    pub fn spawn(self, subscription: Subscription) -> Result<ChannelTask<E, H>, ChannelError> {
        let runtime = Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;
        let (registration, messages) = subscription.split();
        let handle = runtime.spawn(self.drive(messages));
        Ok(ChannelTask {
            handle: Some(handle),
            registration: Some(registration),
        })
    }
}

impl<E: EditorEndpoint, H> std::fmt::Debug for DiagramChannel<E, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramChannel")
            .field("endpoint", &self.endpoint.id())
            .field("state", &self.state)
            .field("xml_len", &self.xml.len())
            .field("autosave", &self.autosave)
            .finish()
    }
}

/// Handle to a spawned channel. Dropping it aborts the task and removes
/// the hub listener.
pub struct ChannelTask<E, H> {
    handle: Option<JoinHandle<DiagramChannel<E, H>>>,
    registration: Option<Registration>,
}

impl<E, H> std::fmt::Debug for ChannelTask<E, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelTask")
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<E, H> ChannelTask<E, H> {
    /// Whether the channel stopped (exit, hub gone, or aborted).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the channel to stop and take it back.
    ///
    /// `None` if the task was aborted or panicked.
    pub async fn join(mut self) -> Option<DiagramChannel<E, H>> {
        let handle = self.handle.take()?;
        let channel = handle.await.ok();
        drop(self.registration.take());
        channel
    }
}

impl<E, H> Drop for ChannelTask<E, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        drop(self.registration.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::hub::{MessageHub, PortEndpoint};
    use serde_json::json;

    const EDITOR: EndpointId = EndpointId::new(1);

    type Events = mpsc::UnboundedReceiver<DiagramEvent>;
    type Inbox = mpsc::UnboundedReceiver<String>;

    fn channel(xml: &str) -> (DiagramChannel<PortEndpoint, mpsc::UnboundedSender<DiagramEvent>>, Inbox, Events) {
        let (endpoint, inbox) = PortEndpoint::pair(EDITOR);
        let (events_tx, events) = mpsc::unbounded_channel();
        (DiagramChannel::new(endpoint, events_tx, xml), inbox, events)
    }

    fn from_editor(data: &str) -> Envelope {
        Envelope::new(EDITOR, data)
    }

    fn drain(inbox: &mut Inbox) -> Vec<String> {
        std::iter::from_fn(|| inbox.try_recv().ok()).collect()
    }

    #[test]
    fn test_init_sends_exactly_one_load() {
        let (mut channel, mut inbox, _events) = channel("<mxfile/>");
        assert_eq!(channel.state(), ChannelState::Uninitialized);

        assert_eq!(channel.handle(&from_editor(r#"{"event":"init"}"#)), Some(Dispatch::Loaded));

        assert_eq!(channel.state(), ChannelState::Ready);
        assert_eq!(
            drain(&mut inbox),
            vec![r#"{"action":"load","xml":"<mxfile/>","autosave":1}"#.to_string()]
        );
    }

    #[test]
    fn test_reinit_resends_cached_payload() {
        let (mut channel, mut inbox, _events) = channel("");
        channel.handle(&from_editor(r#"{"event":"init"}"#));
        channel.handle(&from_editor(r#"{"event":"save","xml":"<v2/>"}"#));
        drain(&mut inbox);

        assert_eq!(channel.handle(&from_editor(r#"{"event":"init"}"#)), Some(Dispatch::Loaded));
        assert_eq!(
            drain(&mut inbox),
            vec![r#"{"action":"load","xml":"<v2/>","autosave":1}"#.to_string()]
        );
    }

    #[test]
    fn test_autosave_flag_off() {
        let (channel, mut inbox, _events) = channel("");
        let mut channel = channel.with_autosave(false);
        channel.handle(&from_editor(r#"{"event":"init"}"#));
        assert_eq!(
            drain(&mut inbox),
            vec![r#"{"action":"load","xml":"","autosave":0}"#.to_string()]
        );
    }

    #[test]
    fn test_foreign_source_is_ignored() {
        let (mut channel, mut inbox, mut events) = channel("");
        let foreign = Envelope::new(EndpointId::new(2), r#"{"event":"init"}"#);
        let anonymous = Envelope::anonymous(r#"{"event":"init"}"#);

        assert_eq!(channel.handle(&foreign), None);
        assert_eq!(channel.handle(&anonymous), None);
        assert_eq!(channel.state(), ChannelState::Uninitialized);
        assert!(drain(&mut inbox).is_empty());

        channel.handle(&from_editor(r#"{"event":"init"}"#));
        let foreign_save = Envelope::new(EndpointId::new(2), r#"{"event":"save","xml":"<evil/>"}"#);
        assert_eq!(channel.handle(&foreign_save), None);
        assert!(events.try_recv().is_err());
        assert_eq!(channel.xml(), "");
    }

    #[test]
    fn test_undecodable_messages_are_discarded() {
        let (mut channel, _inbox, mut events) = channel("");
        channel.handle(&from_editor(r#"{"event":"init"}"#));

        for data in ["garbage", r#"{"event":"zoom"}"#, r#"{"event":"save"}"#, r#"{"event":"autosave","xml":""}"#] {
            assert_eq!(channel.handle(&from_editor(data)), None, "{data}");
        }
        assert!(events.try_recv().is_err());
        assert_eq!(channel.state(), ChannelState::Ready);
    }

    #[test]
    fn test_commands_before_init_are_discarded() {
        let (mut channel, _inbox, mut events) = channel("");
        assert_eq!(channel.handle(&from_editor(r#"{"event":"save","xml":"<a/>"}"#)), None);
        assert_eq!(channel.handle(&from_editor(r#"{"event":"exit"}"#)), None);
        assert!(events.try_recv().is_err());
        assert_eq!(channel.state(), ChannelState::Uninitialized);
    }

    #[test]
    fn test_save_and_autosave_update_cache() {
        let (mut channel, _inbox, mut events) = channel("<old/>");
        channel.handle(&from_editor(r#"{"event":"init"}"#));

        let save = Envelope::new(EDITOR, json!({"event": "save", "xml": "<one/>"}));
        assert_eq!(channel.handle(&save), Some(Dispatch::Saved));
        assert_eq!(channel.handle(&from_editor(r#"{"event":"autosave","xml":"<two/>"}"#)), Some(Dispatch::Saved));

        assert_eq!(channel.xml(), "<two/>");
        assert_eq!(events.try_recv().unwrap(), DiagramEvent::Saved("<one/>".into()));
        assert_eq!(events.try_recv().unwrap(), DiagramEvent::Saved("<two/>".into()));
    }

    #[test]
    fn test_exit_fires_once() {
        let (mut channel, mut inbox, mut events) = channel("");
        channel.handle(&from_editor(r#"{"event":"init"}"#));
        drain(&mut inbox);

        assert_eq!(channel.handle(&from_editor(r#"{"event":"exit"}"#)), Some(Dispatch::Exited));
        assert_eq!(channel.handle(&from_editor(r#"{"event":"exit"}"#)), None);
        assert_eq!(channel.handle(&from_editor(r#"{"event":"init"}"#)), None);

        assert_eq!(channel.state(), ChannelState::Exited);
        assert_eq!(events.try_recv().unwrap(), DiagramEvent::Exited);
        assert!(events.try_recv().is_err());
        assert!(drain(&mut inbox).is_empty());
    }

    #[test]
    fn test_closed_endpoint_still_becomes_ready() {
        let (mut channel, inbox, _events) = channel("");
        drop(inbox);
        assert_eq!(channel.handle(&from_editor(r#"{"event":"init"}"#)), None);
        assert_eq!(channel.state(), ChannelState::Ready);
    }

    #[test]
    fn test_spawn_outside_runtime() {
        let hub = MessageHub::new();
        let (channel, _inbox, _events) = channel("");
        assert!(matches!(channel.spawn(hub.subscribe()), Err(ChannelError::NoRuntime)));
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_spawned_channel_runs_until_exit() {
        let hub = MessageHub::new();
        let (channel, mut inbox, mut events) = channel("<mxfile/>");
        let task = channel.spawn(hub.subscribe()).unwrap();

        hub.post(EDITOR, r#"{"event":"init"}"#);
        assert_eq!(
            inbox.recv().await.unwrap(),
            r#"{"action":"load","xml":"<mxfile/>","autosave":1}"#
        );
        hub.post(EDITOR, r#"{"event":"save","xml":"<new/>"}"#);
        assert_eq!(events.recv().await.unwrap(), DiagramEvent::Saved("<new/>".into()));
        hub.post(EDITOR, r#"{"event":"exit"}"#);
        assert_eq!(events.recv().await.unwrap(), DiagramEvent::Exited);

        let channel = task.join().await.unwrap();
        assert_eq!(channel.state(), ChannelState::Exited);
        assert_eq!(channel.xml(), "<new/>");
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_task_deregisters_listener() {
        let hub = MessageHub::new();
        let (channel, _inbox, _events) = channel("");
        let task = channel.spawn(hub.subscribe()).unwrap();
        assert_eq!(hub.listener_count(), 1);

        drop(task);
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(hub.post(EDITOR, r#"{"event":"init"}"#), 0);
    }

    #[tokio::test]
    async fn test_run_deregisters_on_exit() {
        let hub = MessageHub::new();
        let (mut channel, _inbox, _events) = channel("");
        channel.handle(&from_editor(r#"{"event":"init"}"#));
        let subscription = hub.subscribe();
        hub.post(EDITOR, r#"{"event":"exit"}"#);

        let channel = channel.run(subscription).await;
        assert_eq!(channel.state(), ChannelState::Exited);
        assert_eq!(hub.listener_count(), 0);
    }
}
