// src/runtime.rs
//! Session reactor: a single task owns the `FeedSession` and processes one
//! reaction at a time (user command, link report, cooldown timer). Consumers
//! talk to it through a cloneable `FeedHandle` and read a `watch` snapshot
//! that is republished after every reaction.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::link::{Connector, LinkEvent};
use crate::session::{FeedSession, FeedSnapshot, SessionLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("feed session is no longer running")]
pub struct SessionClosed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// False when the toggle landed inside the cooldown window.
    pub accepted: bool,
    pub live: bool,
    pub cooldown: bool,
}

enum Command {
    Toggle(oneshot::Sender<ToggleOutcome>),
    Reset(oneshot::Sender<FeedSnapshot>),
    SetEndpoint(Url),
    Shutdown,
}

#[derive(Clone)]
pub struct FeedHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<FeedSnapshot>,
}

impl FeedHandle {
    pub async fn toggle(&self) -> Result<ToggleOutcome, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Toggle(tx))
            .map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Resolves with the state right after the reset.
    pub async fn reset(&self) -> Result<FeedSnapshot, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Reset(tx))
            .map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub fn set_endpoint(&self, endpoint: Url) -> Result<(), SessionClosed> {
        self.commands
            .send(Command::SetEndpoint(endpoint))
            .map_err(|_| SessionClosed)
    }

    /// Ask the reactor to close its link and stop. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.clone()
    }
}

/// Spawn the reactor for one session. The session starts idle; nothing
/// connects until the first accepted toggle.
pub fn spawn_session<C: Connector>(
    endpoint: Url,
    connector: C,
    limits: SessionLimits,
) -> (FeedHandle, JoinHandle<()>) {
    let (session, links) = FeedSession::with_limits(endpoint, connector, limits);
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (snap_tx, snap_rx) = watch::channel(session.snapshot(Utc::now()));

    let task = tokio::spawn(run_reactor(session, links, cmd_rx, snap_tx));
    let handle = FeedHandle {
        commands: cmd_tx,
        snapshots: snap_rx,
    };
    (handle, task)
}

async fn run_reactor<C: Connector>(
    mut session: FeedSession<C>,
    mut links: mpsc::UnboundedReceiver<LinkEvent>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<FeedSnapshot>,
) {
    tracing::info!(endpoint = %session.endpoint(), "feed session started");

    loop {
        let cooldown_wait = session
            .cooldown_deadline()
            .map(|until| (until - Utc::now()).to_std().unwrap_or_default());

        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Command::Toggle(reply)) => {
                    let now = Utc::now();
                    let accepted = session.toggle(now);
                    // publish before replying so the caller never reads an older snapshot
                    publish(&session, &snapshots);
                    let _ = reply.send(ToggleOutcome {
                        accepted,
                        live: session.live(),
                        cooldown: session.cooldown(now),
                    });
                }
                Some(Command::Reset(reply)) => {
                    session.reset();
                    let _ = reply.send(publish(&session, &snapshots));
                }
                Some(Command::SetEndpoint(endpoint)) => session.set_endpoint(endpoint),
                Some(Command::Shutdown) | None => break,
            },
            Some(ev) = links.recv() => {
                session.handle_link_event(ev);
            }
            _ = tokio::time::sleep(cooldown_wait.unwrap_or_default()), if cooldown_wait.is_some() => {
                session.expire_cooldown(Utc::now());
            }
        }

        publish(&session, &snapshots);
    }

    session.teardown();
    publish(&session, &snapshots);
    tracing::info!("feed session stopped");
}

fn publish<C: Connector>(
    session: &FeedSession<C>,
    snapshots: &watch::Sender<FeedSnapshot>,
) -> FeedSnapshot {
    let snap = session.snapshot(Utc::now());
    snapshots.send_replace(snap.clone());
    snap
}
