//! # Feed History
//! Bounded newest-first store of admitted events (default 20).
//!
//! Order is arrival order. The producer's `timestamp` is never consulted, so
//! out-of-order timestamps are kept exactly where they arrived. The "latest"
//! views are projections over the buffer and are recomputed on every read.

use std::collections::VecDeque;

use metrics::{describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::event::{Category, FeedEvent};

/// Default number of events kept.
pub const HISTORY_CAPACITY: usize = 20;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_gauge!("feed_history_len", "Events currently held in the feed history.");
    });
}

#[derive(Debug, Clone)]
pub struct FeedStore {
    /// Newest at the front.
    buf: VecDeque<FeedEvent>,
    cap: usize,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(cap.min(10_000)),
            cap,
        }
    }

    /// Insert at the front and evict from the tail past capacity.
    pub fn append(&mut self, ev: FeedEvent) {
        ensure_metrics_described();
        self.buf.push_front(ev);
        self.buf.truncate(self.cap);
        gauge!("feed_history_len").set(self.buf.len() as f64);
    }

    pub fn latest(&self) -> Option<&FeedEvent> {
        self.buf.front()
    }

    /// Most recent event of `category`; a front-to-back scan is enough because
    /// the buffer is newest-first.
    pub fn latest_by_category(&self, category: Category) -> Option<&FeedEvent> {
        self.buf.iter().find(|e| e.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedEvent> + '_ {
        self.buf.iter()
    }

    /// Owned copy, newest first.
    pub fn snapshot(&self) -> Vec<FeedEvent> {
        self.buf.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        gauge!("feed_history_len").set(0.0);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new()
    }
}
