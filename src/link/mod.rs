// src/link/mod.rs
//! Connection controller: keeps at most one link matching the desired
//! (endpoint, enabled) pair and decides which inbound payloads are forwarded.

pub mod scripted;
pub mod types;
pub mod ws;

pub use scripted::ScriptedConnector;
pub use types::{ConnectionId, Connector, LinkEvent, LinkEventKind, LinkEvents, LinkHandle};
pub use ws::WsConnector;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use url::Url;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_connections_opened_total", "Live connections opened.");
        describe_counter!("feed_connections_closed_total", "Live connections reported closed.");
        describe_counter!("feed_transport_errors_total", "Transport errors reported by links.");
        describe_counter!(
            "feed_stale_dropped_total",
            "Payloads dropped because their link was not the current open one."
        );
    });
}

/// What the owner wants right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desired {
    pub endpoint: Url,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Close(ConnectionId),
    Open(Url),
}

/// Observable state of the current link. No link means idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Connecting,
    Open,
}

/// Diff desired against current: at most one close, then at most one open.
pub fn reconcile(desired: &Desired, current: Option<(ConnectionId, &Url)>) -> Vec<Transition> {
    let mut plan = Vec::with_capacity(2);
    if let Some((id, endpoint)) = current {
        if desired.enabled && *endpoint == desired.endpoint {
            return plan;
        }
        plan.push(Transition::Close(id));
    }
    if desired.enabled {
        plan.push(Transition::Open(desired.endpoint.clone()));
    }
    plan
}

#[derive(Debug)]
struct ActiveLink {
    id: ConnectionId,
    endpoint: Url,
    state: LinkState,
    handle: LinkHandle,
}

pub struct ConnectionController<C> {
    connector: C,
    events: LinkEvents,
    applied: Option<Desired>,
    current: Option<ActiveLink>,
    next_id: ConnectionId,
}

impl<C: Connector> ConnectionController<C> {
    pub fn new(connector: C, events: LinkEvents) -> Self {
        ensure_metrics_described();
        Self {
            connector,
            events,
            applied: None,
            current: None,
            next_id: 1,
        }
    }

    /// Re-evaluates only when the desired pair differs from the last applied
    /// one. A link that closed on its own is therefore not reopened until the
    /// pair changes again.
    pub fn apply(&mut self, desired: Desired) {
        if self.applied.as_ref() == Some(&desired) {
            return;
        }
        let current = self.current.as_ref().map(|l| (l.id, &l.endpoint));
        for step in reconcile(&desired, current) {
            match step {
                Transition::Close(_) => self.close_current("desired state changed"),
                Transition::Open(endpoint) => self.open(endpoint),
            }
        }
        self.applied = Some(desired);
    }

    /// Close whatever is open and forget the applied pair.
    pub fn teardown(&mut self) {
        self.close_current("owner teardown");
        self.applied = None;
    }

    /// Handles one link report. Returns the payload when it passes the
    /// readiness check: it came from the current link and that link is open.
    pub fn on_event(&mut self, ev: LinkEvent) -> Option<String> {
        let LinkEvent { id, kind } = ev;
        let current = self.current.as_mut().filter(|l| l.id == id);

        match kind {
            LinkEventKind::Opened => {
                match current {
                    Some(link) => {
                        link.state = LinkState::Open;
                        tracing::info!(link = id, endpoint = %link.endpoint, "live connection open");
                    }
                    None => tracing::debug!(link = id, "detached link finished handshake"),
                }
                None
            }
            LinkEventKind::Payload(raw) => match current {
                Some(link) if link.state == LinkState::Open => Some(raw),
                _ => {
                    counter!("feed_stale_dropped_total").increment(1);
                    tracing::debug!(link = id, "dropping payload from link that is not open");
                    None
                }
            },
            LinkEventKind::Error(msg) => {
                counter!("feed_transport_errors_total").increment(1);
                tracing::warn!(link = id, error = %msg, "live connection error");
                None
            }
            LinkEventKind::Closed(reason) => {
                counter!("feed_connections_closed_total").increment(1);
                let reason = reason.as_deref().unwrap_or("none");
                if current.is_some() {
                    tracing::warn!(link = id, reason, "live connection closed");
                    self.current = None;
                } else {
                    tracing::info!(link = id, reason, "detached link closed");
                }
                None
            }
        }
    }

    pub fn link_state(&self) -> Option<LinkState> {
        self.current.as_ref().map(|l| l.state)
    }

    pub fn current_id(&self) -> Option<ConnectionId> {
        self.current.as_ref().map(|l| l.id)
    }

    fn open(&mut self, endpoint: Url) {
        let id = self.next_id;
        self.next_id += 1;
        tracing::info!(link = id, endpoint = %endpoint, "opening live connection");
        counter!("feed_connections_opened_total").increment(1);
        let handle = self.connector.open(id, &endpoint, self.events.clone());
        self.current = Some(ActiveLink {
            id,
            endpoint,
            state: LinkState::Connecting,
            handle,
        });
    }

    fn close_current(&mut self, why: &'static str) {
        if let Some(link) = self.current.take() {
            tracing::info!(link = link.id, reason = why, "closing live connection");
            link.handle.close();
        }
    }
}
