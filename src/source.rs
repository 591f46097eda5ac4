//! # Demo Source
//! WebSocket endpoint (`/ws`) that pushes one random feed event per interval,
//! stamped with Los Angeles local time. Used for local runs and end-to-end tests.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use chrono::{SecondsFormat, Utc};
use chrono_tz::America::Los_Angeles;
use rand::{seq::IndexedRandom, Rng};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::event::{Category, FeedEvent};

const STATUS_OPTIONS: [&str; 3] = ["Deep focus mode", "At the gym", "Refactoring"];
const NOTIFICATIONS: [&str; 3] = [
    "New Slack message from Vincent Todd",
    "CS Club meeting right now!",
    "Mom texted: How are you?",
];
const ACTIVITIES: [&str; 3] = [
    "Walking King",
    "Playing Elden Ring",
    "Looking at UCI Apartments",
];

#[derive(Debug, Clone, Copy)]
pub struct SourceConfig {
    pub interval: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
        }
    }
}

/// Random category, random content from that category's pool.
pub fn random_event<R: Rng + ?Sized>(rng: &mut R) -> FeedEvent {
    let category = Category::ALL
        .choose(rng)
        .copied()
        .unwrap_or(Category::Status);
    let pool: &[&str] = match category {
        Category::Status => &STATUS_OPTIONS,
        Category::Notification => &NOTIFICATIONS,
        Category::Activity => &ACTIVITIES,
    };
    let content = pool.choose(rng).copied().unwrap_or_default();
    let timestamp = Utc::now()
        .with_timezone(&Los_Angeles)
        .to_rfc3339_opts(SecondsFormat::Micros, false);
    FeedEvent::new(timestamp, category, content)
}

pub fn router(cfg: SourceConfig) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ws", get(ws_upgrade))
        .layer(CorsLayer::very_permissive())
        .with_state(cfg)
}

/// Serve the demo source on an already bound listener.
pub async fn serve(listener: TcpListener, cfg: SourceConfig) -> std::io::Result<()> {
    axum::serve(listener, router(cfg)).await
}

async fn ws_upgrade(State(cfg): State<SourceConfig>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| stream_events(socket, cfg.interval))
}

async fn stream_events(mut socket: WebSocket, interval: Duration) {
    tracing::info!(target: "source", "client connected");
    // first tick fires immediately, so a new client gets an event right away
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let ev = random_event(&mut rand::rng());
                let text = match serde_json::to_string(&ev) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!(target: "source", error = %e, "encode failed");
                        continue;
                    }
                };
                tracing::debug!(target: "source", payload = %text, "sending");
                if let Err(e) = socket.send(Message::Text(text.into())).await {
                    tracing::warn!(target: "source", error = %e, "send failed");
                    break;
                }
            }
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(target: "source", "client disconnected");
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!(target: "source", error = %e, "client socket error");
                    break;
                }
                Some(Ok(_)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::decode;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_events_pass_admission() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let ev = random_event(&mut rng);
            let wire = serde_json::to_string(&ev).unwrap();
            let back = decode(&wire).unwrap();
            assert_eq!(back, ev);
            let pool: &[&str] = match ev.category {
                Category::Status => &STATUS_OPTIONS,
                Category::Notification => &NOTIFICATIONS,
                Category::Activity => &ACTIVITIES,
            };
            assert!(pool.contains(&ev.content.as_str()));
        }
    }

    #[test]
    fn timestamp_carries_pacific_offset() {
        let ev = random_event(&mut rand::rng());
        assert!(
            ev.timestamp.ends_with("-07:00") || ev.timestamp.ends_with("-08:00"),
            "unexpected offset: {}",
            ev.timestamp
        );
    }
}
