// tests/reactor.rs
//
// The spawned session reactor driven through `FeedHandle`, with the scripted
// connector standing in for the network.

use std::time::Duration;

use live_feed::link::{LinkState, ScriptedConnector};
use live_feed::{spawn_session, FeedSnapshot, SessionClosed, SessionLimits};
use tokio::sync::watch;
use tokio::time::timeout;
use url::Url;

const WAIT: Duration = Duration::from_secs(2);

fn endpoint() -> Url {
    Url::parse("ws://localhost:8000/ws").unwrap()
}

fn short_cooldown() -> SessionLimits {
    SessionLimits {
        cooldown_ms: 80,
        ..SessionLimits::default()
    }
}

fn payload(kind: &str, content: &str) -> String {
    serde_json::json!({ "timestamp": "t", "type": kind, "content": content }).to_string()
}

async fn wait_until<F>(rx: &mut watch::Receiver<FeedSnapshot>, pred: F) -> FeedSnapshot
where
    F: FnMut(&FeedSnapshot) -> bool,
{
    let snap = timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("snapshot condition not reached in time")
        .expect("session stopped");
    snap.clone()
}

#[tokio::test]
async fn toggle_cooldown_then_second_flip() {
    let conn = ScriptedConnector::new();
    let (feed, _task) = spawn_session(endpoint(), conn.clone(), short_cooldown());
    let mut rx = feed.subscribe();

    let first = feed.toggle().await.unwrap();
    assert!(first.accepted);
    assert!(first.live);
    assert!(first.cooldown);

    let second = feed.toggle().await.unwrap();
    assert!(!second.accepted);
    assert!(second.live);

    // reactor clears the flag on its own when the window ends
    wait_until(&mut rx, |s| !s.cooldown).await;

    let third = feed.toggle().await.unwrap();
    assert!(third.accepted);
    assert!(!third.live);
    assert!(conn.is_closed(conn.last_id().unwrap()));
}

#[tokio::test]
async fn admitted_events_are_published() {
    let conn = ScriptedConnector::new();
    let (feed, _task) = spawn_session(endpoint(), conn.clone(), SessionLimits::default());
    let mut rx = feed.subscribe();

    feed.toggle().await.unwrap();
    let id = conn.last_id().unwrap();
    conn.confirm_open(id);
    wait_until(&mut rx, |s| s.connection == Some(LinkState::Open)).await;

    conn.deliver(id, &payload("status", "A"));
    conn.deliver(id, &payload("alert", "dropped"));
    conn.deliver(id, &payload("notification", "B"));

    let snap = wait_until(&mut rx, |s| s.history.len() == 2).await;
    assert_eq!(snap.latest.as_ref().unwrap().content, "B");
    assert_eq!(snap.latest_by_category.status.as_ref().unwrap().content, "A");
    assert!(snap.latest_by_category.activity.is_none());
    assert_eq!(feed.snapshot(), snap);
}

#[tokio::test]
async fn reset_mid_cooldown_returns_idle_empty_state() {
    let conn = ScriptedConnector::new();
    let (feed, _task) = spawn_session(endpoint(), conn.clone(), SessionLimits::default());
    let mut rx = feed.subscribe();

    feed.toggle().await.unwrap();
    let id = conn.last_id().unwrap();
    conn.confirm_open(id);
    conn.deliver(id, &payload("activity", "x"));
    wait_until(&mut rx, |s| !s.history.is_empty()).await;

    let after = feed.reset().await.unwrap();
    assert!(after.history.is_empty());
    assert!(!after.live);
    assert!(!after.cooldown);
    assert!(after.connection.is_none());
    assert!(conn.is_closed(id));

    // 1s cooldown was cancelled, so this toggle is accepted immediately
    assert!(feed.toggle().await.unwrap().accepted);
}

#[tokio::test]
async fn shutdown_closes_link_and_handle_reports_closed() {
    let conn = ScriptedConnector::new();
    let (feed, task) = spawn_session(endpoint(), conn.clone(), SessionLimits::default());

    feed.toggle().await.unwrap();
    let id = conn.last_id().unwrap();

    feed.shutdown();
    timeout(WAIT, task).await.unwrap().unwrap();

    assert!(conn.is_closed(id));
    assert_eq!(feed.toggle().await, Err(SessionClosed));
    assert!(feed.reset().await.is_err());
}

#[tokio::test]
async fn dropping_every_handle_stops_the_session() {
    let conn = ScriptedConnector::new();
    let (feed, task) = spawn_session(endpoint(), conn.clone(), SessionLimits::default());

    feed.toggle().await.unwrap();
    let id = conn.last_id().unwrap();
    drop(feed);

    timeout(WAIT, task).await.unwrap().unwrap();
    assert!(conn.is_closed(id));
}
