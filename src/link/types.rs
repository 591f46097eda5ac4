// src/link/types.rs
use tokio::sync::{mpsc, oneshot};
use url::Url;

/// Monotonic id of one connection attempt, unique per controller.
pub type ConnectionId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEventKind {
    /// Handshake finished; the link is ready.
    Opened,
    /// One inbound text frame.
    Payload(String),
    /// Transport-level failure. Informational; a `Closed` follows.
    Error(String),
    /// Link ended, with the peer's reason when one was given.
    Closed(Option<String>),
}

/// Everything a link reports is tagged with the id it was opened under, so the
/// owner can tell current traffic from a link it already let go of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    pub id: ConnectionId,
    pub kind: LinkEventKind,
}

impl LinkEvent {
    pub fn new(id: ConnectionId, kind: LinkEventKind) -> Self {
        Self { id, kind }
    }
}

pub type LinkEvents = mpsc::UnboundedSender<LinkEvent>;

/// Owning side of one link. Closing or dropping it signals the link to shut down.
#[derive(Debug)]
pub struct LinkHandle {
    id: ConnectionId,
    shutdown: Option<oneshot::Sender<()>>,
}

impl LinkHandle {
    /// Returns the handle and the receiver the link task waits on.
    pub fn new(id: ConnectionId) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                id,
                shutdown: Some(tx),
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn close(mut self) {
        self.signal();
    }

    fn signal(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            // receiver already gone means the link ended on its own
            let _ = tx.send(());
        }
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

/// Opens physical links. Implementations report through `events` and must stop
/// once the returned handle is closed or dropped.
pub trait Connector: Send + 'static {
    fn open(&self, id: ConnectionId, endpoint: &Url, events: LinkEvents) -> LinkHandle;
}
