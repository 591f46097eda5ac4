// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod admission;
pub mod antiflutter;
pub mod api;
pub mod config;
pub mod event;
pub mod history;
pub mod link;
pub mod metrics;
pub mod runtime;
pub mod session;
pub mod source;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::admission::{admit, decode, DecodeFailure};
pub use crate::api::create_router;
pub use crate::event::{Category, FeedEvent};
pub use crate::history::{FeedStore, HISTORY_CAPACITY};
pub use crate::runtime::{spawn_session, FeedHandle, SessionClosed, ToggleOutcome};
pub use crate::session::{FeedSession, FeedSnapshot, SessionLimits};
