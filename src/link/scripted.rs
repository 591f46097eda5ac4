// src/link/scripted.rs
// --- Test helper ---
// In-memory connector: records every open, lets a test observe closes and
// push link events as if they came off the wire.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot::{self, error::TryRecvError};
use url::Url;

use super::types::{ConnectionId, Connector, LinkEvent, LinkEventKind, LinkEvents, LinkHandle};

#[derive(Debug)]
struct ScriptedLink {
    id: ConnectionId,
    endpoint: Url,
    events: LinkEvents,
    shutdown: oneshot::Receiver<()>,
    closed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    links: Arc<Mutex<Vec<ScriptedLink>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ScriptedLink>> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn opened(&self) -> Vec<(ConnectionId, Url)> {
        self.lock()
            .iter()
            .map(|l| (l.id, l.endpoint.clone()))
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.lock().len()
    }

    pub fn last_id(&self) -> Option<ConnectionId> {
        self.lock().last().map(|l| l.id)
    }

    /// True once the owner closed or dropped the handle for `id`.
    pub fn is_closed(&self, id: ConnectionId) -> bool {
        let mut links = self.lock();
        let Some(link) = links.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        if !link.closed && !matches!(link.shutdown.try_recv(), Err(TryRecvError::Empty)) {
            link.closed = true;
        }
        link.closed
    }

    /// Push a report for link `id` into the owner's channel.
    pub fn emit(&self, id: ConnectionId, kind: LinkEventKind) -> bool {
        let links = self.lock();
        match links.iter().find(|l| l.id == id) {
            Some(link) => link.events.send(LinkEvent::new(id, kind)).is_ok(),
            None => false,
        }
    }

    pub fn confirm_open(&self, id: ConnectionId) -> bool {
        self.emit(id, LinkEventKind::Opened)
    }

    pub fn deliver(&self, id: ConnectionId, raw: &str) -> bool {
        self.emit(id, LinkEventKind::Payload(raw.to_string()))
    }
}

impl Connector for ScriptedConnector {
    fn open(&self, id: ConnectionId, endpoint: &Url, events: LinkEvents) -> LinkHandle {
        let (handle, shutdown) = LinkHandle::new(id);
        self.lock().push(ScriptedLink {
            id,
            endpoint: endpoint.clone(),
            events,
            shutdown,
            closed: false,
        });
        handle
    }
}
