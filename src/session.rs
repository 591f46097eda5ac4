// src/session.rs
//! One viewer session: feed history, toggle guard and connection controller,
//! driven by discrete reactions. Nothing here blocks or spawns; the reactor in
//! `runtime.rs` feeds it one reaction at a time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use url::Url;

use crate::admission;
use crate::antiflutter::{ToggleGuard, TOGGLE_COOLDOWN_MS};
use crate::event::{Category, FeedEvent};
use crate::history::{FeedStore, HISTORY_CAPACITY};
use crate::link::{ConnectionController, Connector, Desired, LinkEvent, LinkState};

#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub history_capacity: usize,
    pub cooldown_ms: i64,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            cooldown_ms: TOGGLE_COOLDOWN_MS,
        }
    }
}

/// Most recent event per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LatestByCategory {
    pub status: Option<FeedEvent>,
    pub notification: Option<FeedEvent>,
    pub activity: Option<FeedEvent>,
}

impl LatestByCategory {
    pub fn get(&self, category: Category) -> Option<&FeedEvent> {
        match category {
            Category::Status => self.status.as_ref(),
            Category::Notification => self.notification.as_ref(),
            Category::Activity => self.activity.as_ref(),
        }
    }
}

/// Consumer-visible state after one reaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedSnapshot {
    /// Newest first.
    pub history: Vec<FeedEvent>,
    pub latest: Option<FeedEvent>,
    pub latest_by_category: LatestByCategory,
    pub live: bool,
    pub cooldown: bool,
    /// `None` while idle.
    pub connection: Option<LinkState>,
}

pub struct FeedSession<C> {
    endpoint: Url,
    store: FeedStore,
    guard: ToggleGuard,
    controller: ConnectionController<C>,
}

impl<C: Connector> FeedSession<C> {
    /// New idle session. The receiver carries link reports back to whoever
    /// drives the session.
    pub fn new(endpoint: Url, connector: C) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        Self::with_limits(endpoint, connector, SessionLimits::default())
    }

    pub fn with_limits(
        endpoint: Url,
        connector: C,
        limits: SessionLimits,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            endpoint,
            store: FeedStore::with_capacity(limits.history_capacity),
            guard: ToggleGuard::new(limits.cooldown_ms),
            controller: ConnectionController::new(connector, tx),
        };
        (session, rx)
    }

    /// User start/stop. Returns false when swallowed by the cooldown.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        let flipped = self.guard.toggle(now);
        if flipped {
            tracing::info!(live = self.guard.live(), "feed toggled");
            self.sync();
        }
        flipped
    }

    /// Back to idle and empty, regardless of cooldown.
    pub fn reset(&mut self) {
        self.guard.reset();
        self.store.clear();
        self.sync();
        tracing::info!("feed reset");
    }

    pub fn set_endpoint(&mut self, endpoint: Url) {
        self.endpoint = endpoint;
        self.sync();
    }

    /// Returns true when the history changed.
    pub fn handle_link_event(&mut self, ev: LinkEvent) -> bool {
        let Some(raw) = self.controller.on_event(ev) else {
            return false;
        };
        match admission::admit(&raw) {
            Ok(event) => {
                self.store.append(event);
                true
            }
            Err(_) => false,
        }
    }

    /// Cooldown timer fired.
    pub fn expire_cooldown(&mut self, now: DateTime<Utc>) -> bool {
        self.guard.expire(now)
    }

    pub fn cooldown_deadline(&self) -> Option<DateTime<Utc>> {
        self.guard.cooldown_deadline()
    }

    pub fn teardown(&mut self) {
        self.controller.teardown();
    }

    pub fn history(&self) -> &FeedStore {
        &self.store
    }

    pub fn latest(&self) -> Option<&FeedEvent> {
        self.store.latest()
    }

    pub fn latest_by_category(&self, category: Category) -> Option<&FeedEvent> {
        self.store.latest_by_category(category)
    }

    pub fn live(&self) -> bool {
        self.guard.live()
    }

    pub fn cooldown(&self, now: DateTime<Utc>) -> bool {
        self.guard.cooldown_active(now)
    }

    pub fn link_state(&self) -> Option<LinkState> {
        self.controller.link_state()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> FeedSnapshot {
        let pick = |c| self.store.latest_by_category(c).cloned();
        FeedSnapshot {
            history: self.store.snapshot(),
            latest: self.store.latest().cloned(),
            latest_by_category: LatestByCategory {
                status: pick(Category::Status),
                notification: pick(Category::Notification),
                activity: pick(Category::Activity),
            },
            live: self.guard.live(),
            cooldown: self.guard.cooldown_active(now),
            connection: self.controller.link_state(),
        }
    }

    fn sync(&mut self) {
        self.controller.apply(Desired {
            endpoint: self.endpoint.clone(),
            enabled: self.guard.live(),
        });
    }
}
