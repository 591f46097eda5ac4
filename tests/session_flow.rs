// tests/session_flow.rs
//
// Session-level behaviour with the scripted connector: no sockets, no timers.
// Link reports are drained from the session channel by hand, one reaction at
// a time, exactly as the reactor would.

use chrono::{DateTime, Duration, TimeZone, Utc};
use live_feed::link::{LinkEvent, LinkEventKind, LinkState, ScriptedConnector};
use live_feed::FeedSession;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;

fn t(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap() + Duration::milliseconds(ms)
}

fn endpoint(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn drain(s: &mut FeedSession<ScriptedConnector>, rx: &mut UnboundedReceiver<LinkEvent>) {
    while let Ok(ev) = rx.try_recv() {
        s.handle_link_event(ev);
    }
}

fn payload(kind: &str, content: &str) -> String {
    serde_json::json!({ "timestamp": "t", "type": kind, "content": content }).to_string()
}

#[test]
fn cooldown_allows_one_flip_per_window() {
    let conn = ScriptedConnector::new();
    let (mut s, _rx) = FeedSession::new(endpoint("ws://localhost:8000/ws"), conn.clone());

    assert!(s.toggle(t(0)));
    assert!(!s.toggle(t(500)));
    assert!(s.live());
    assert_eq!(conn.open_count(), 1);

    assert!(s.toggle(t(1_000)));
    assert!(!s.live());
    assert!(conn.is_closed(conn.last_id().unwrap()));
}

#[test]
fn reset_is_idempotent_and_works_mid_cooldown() {
    let conn = ScriptedConnector::new();
    let (mut s, mut rx) = FeedSession::new(endpoint("ws://localhost:8000/ws"), conn.clone());

    s.toggle(t(0));
    let id = conn.last_id().unwrap();
    conn.confirm_open(id);
    conn.deliver(id, &payload("status", "A"));
    drain(&mut s, &mut rx);
    assert_eq!(s.history().len(), 1);

    s.reset();
    let once = s.snapshot(t(10));
    s.reset();
    let twice = s.snapshot(t(10));

    assert_eq!(once, twice);
    assert!(once.history.is_empty());
    assert!(!once.live);
    assert!(!once.cooldown);
    assert!(once.connection.is_none());
    assert!(conn.is_closed(id));

    // cooldown is gone, so the user can start again right away
    assert!(s.toggle(t(20)));
}

#[test]
fn gap_message_from_previous_link_never_reaches_history() {
    let conn = ScriptedConnector::new();
    let (mut s, mut rx) = FeedSession::new(endpoint("ws://localhost:8000/ws"), conn.clone());

    s.toggle(t(0));
    let first = conn.last_id().unwrap();
    conn.confirm_open(first);
    drain(&mut s, &mut rx);

    // disable, then re-enable before the first link ever reports closed
    s.toggle(t(1_000));
    conn.deliver(first, &payload("status", "stale-1"));
    s.toggle(t(2_000));
    let second = conn.last_id().unwrap();
    assert_ne!(first, second);
    conn.deliver(first, &payload("status", "stale-2"));
    conn.confirm_open(second);
    drain(&mut s, &mut rx);

    assert_eq!(s.link_state(), Some(LinkState::Open));
    assert!(s.history().is_empty(), "stale frames leaked: {:?}", s.history());

    conn.deliver(second, &payload("activity", "fresh"));
    conn.emit(first, LinkEventKind::Closed(None));
    drain(&mut s, &mut rx);
    assert_eq!(s.latest().unwrap().content, "fresh");
    // the late close of the first link does not touch the second
    assert_eq!(s.link_state(), Some(LinkState::Open));
}

#[test]
fn frames_before_open_confirmation_are_dropped() {
    let conn = ScriptedConnector::new();
    let (mut s, mut rx) = FeedSession::new(endpoint("ws://localhost:8000/ws"), conn.clone());

    s.toggle(t(0));
    let id = conn.last_id().unwrap();
    conn.deliver(id, &payload("status", "early"));
    drain(&mut s, &mut rx);
    assert_eq!(s.link_state(), Some(LinkState::Connecting));
    assert!(s.history().is_empty());
}

#[test]
fn decode_failure_does_not_close_the_link() {
    let conn = ScriptedConnector::new();
    let (mut s, mut rx) = FeedSession::new(endpoint("ws://localhost:8000/ws"), conn.clone());

    s.toggle(t(0));
    let id = conn.last_id().unwrap();
    conn.confirm_open(id);
    conn.deliver(id, "{oops");
    conn.deliver(id, &payload("alert", "nope"));
    conn.deliver(id, &payload("notification", "B"));
    drain(&mut s, &mut rx);

    assert!(!conn.is_closed(id));
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.latest().unwrap().content, "B");
}

#[test]
fn transport_error_then_close_goes_idle_and_keeps_history() {
    let conn = ScriptedConnector::new();
    let (mut s, mut rx) = FeedSession::new(endpoint("ws://localhost:8000/ws"), conn.clone());

    s.toggle(t(0));
    let id = conn.last_id().unwrap();
    conn.confirm_open(id);
    conn.deliver(id, &payload("status", "A"));
    conn.emit(id, LinkEventKind::Error("connection reset".into()));
    conn.emit(id, LinkEventKind::Closed(None));
    drain(&mut s, &mut rx);

    assert!(s.link_state().is_none());
    assert!(s.live(), "live flag stays as the user left it");
    assert_eq!(s.history().len(), 1);
    assert_eq!(conn.open_count(), 1, "no automatic reconnect");

    // off and on again reconnects
    s.toggle(t(1_000));
    s.toggle(t(2_000));
    assert_eq!(conn.open_count(), 2);
}

#[test]
fn endpoint_change_while_live_swaps_links() {
    let conn = ScriptedConnector::new();
    let (mut s, _rx) = FeedSession::new(endpoint("ws://a.example/ws"), conn.clone());

    s.toggle(t(0));
    let first = conn.last_id().unwrap();
    s.set_endpoint(endpoint("ws://b.example/ws"));

    let opened = conn.opened();
    assert_eq!(opened.len(), 2);
    assert_eq!(opened[1].1.as_str(), "ws://b.example/ws");
    assert!(conn.is_closed(first));

    // while disabled an endpoint change opens nothing
    s.toggle(t(1_000));
    s.set_endpoint(endpoint("ws://c.example/ws"));
    assert_eq!(conn.open_count(), 2);
}
