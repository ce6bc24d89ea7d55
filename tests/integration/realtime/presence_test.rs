//! Presence and real-time delivery integration tests

use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;

use chatpulse::backend::presence::{CloseOutcome, ConnectionLifecycle, PresenceRegistry};
use chatpulse::backend::realtime::{BroadcastDispatcher, DeliveryOutcome, Outbox};
use chatpulse::shared::{ChatMessage, ConnectionId};

use crate::common::user;

fn dispatcher() -> BroadcastDispatcher {
    BroadcastDispatcher::new(Arc::new(PresenceRegistry::new()))
}

/// Next presence payload queued on an outbox
fn next_online(outbox: &mut Outbox) -> Vec<String> {
    let frame = outbox.presence.try_recv().expect("presence frame queued");
    let event: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(event["event"], "presence-changed");
    serde_json::from_value(event["payload"].clone()).unwrap()
}

fn message(from: &str, to: &str, text: &str) -> ChatMessage {
    ChatMessage::new(user(from), user(to), text.to_string()).unwrap()
}

#[tokio::test]
async fn test_connect_disconnect_scenario() {
    let dispatcher = dispatcher();

    let mut c1 = ConnectionLifecycle::new(dispatcher.clone());
    let mut out1 = c1.open(Some("u1")).unwrap();
    assert_eq!(next_online(&mut out1), vec!["u1"]);

    let mut c2 = ConnectionLifecycle::new(dispatcher.clone());
    let mut out2 = c2.open(Some("u2")).unwrap();
    assert_eq!(next_online(&mut out1), vec!["u1", "u2"]);
    assert_eq!(next_online(&mut out2), vec!["u1", "u2"]);

    assert_eq!(c1.close(), CloseOutcome::Released);
    assert_eq!(next_online(&mut out2), vec!["u2"]);

    // u1 is offline now, so the live push is dropped
    let outcome = dispatcher.deliver_to(&user("u1"), message("u2", "u1", "still there?"));
    assert_eq!(outcome, DeliveryOutcome::Offline);
    assert!(out2.direct.try_recv().is_err());
}

#[tokio::test]
async fn test_stale_close_keeps_newer_connection() {
    let dispatcher = dispatcher();

    let mut first = ConnectionLifecycle::new(dispatcher.clone());
    let _first_out = first.open(Some("u1")).unwrap();

    let mut second = ConnectionLifecycle::new(dispatcher.clone());
    let mut second_out = second.open(Some("u1")).unwrap();
    let _ = next_online(&mut second_out);

    assert_eq!(first.close(), CloseOutcome::Stale);

    let registry = dispatcher.registry();
    assert_eq!(registry.connection_for(&user("u1")), Some(second.connection_id()));
    assert_eq!(registry.snapshot(), vec![user("u1")]);
    // No presence change, no broadcast
    assert!(matches!(second_out.presence.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_delivery_reaches_only_the_recipient() {
    let dispatcher = dispatcher();

    let mut c1 = ConnectionLifecycle::new(dispatcher.clone());
    let mut out1 = c1.open(Some("u1")).unwrap();
    let mut c2 = ConnectionLifecycle::new(dispatcher.clone());
    let mut out2 = c2.open(Some("u2")).unwrap();

    let outcome = dispatcher.deliver_to(&user("u2"), message("u1", "u2", "hi"));
    assert_eq!(outcome, DeliveryOutcome::Delivered(c2.connection_id()));

    let frame = out2.direct.try_recv().unwrap();
    let event: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(event["event"], "message-delivered");
    assert_eq!(event["payload"]["receiver"], "u2");
    assert!(out1.direct.try_recv().is_err());
}

#[tokio::test]
async fn test_delivery_follows_latest_connection() {
    let dispatcher = dispatcher();

    let mut old = ConnectionLifecycle::new(dispatcher.clone());
    let mut old_out = old.open(Some("u1")).unwrap();
    let mut new = ConnectionLifecycle::new(dispatcher.clone());
    let mut new_out = new.open(Some("u1")).unwrap();

    let outcome = dispatcher.deliver_to(&user("u1"), message("u2", "u1", "ping"));
    assert_eq!(outcome, DeliveryOutcome::Delivered(new.connection_id()));
    assert!(new_out.direct.try_recv().is_ok());
    assert!(old_out.direct.try_recv().is_err());
}

#[tokio::test]
async fn test_consecutive_snapshots_are_identical() {
    let dispatcher = dispatcher();
    let mut outbox = dispatcher.attach(ConnectionId::new());

    for name in ["carol", "alice", "bob"] {
        dispatcher.registry().associate(user(name), ConnectionId::new());
    }

    dispatcher.broadcast_presence();
    dispatcher.broadcast_presence();

    let first = outbox.presence.try_recv().unwrap();
    let second = outbox.presence.try_recv().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        &*first,
        r#"{"event":"presence-changed","payload":["alice","bob","carol"]}"#
    );
}

#[tokio::test]
async fn test_rejected_handshake_never_registers() {
    let dispatcher = dispatcher();

    for claimed in [None, Some(""), Some("undefined"), Some("null"), Some(" u1")] {
        let mut lifecycle = ConnectionLifecycle::new(dispatcher.clone());
        assert!(lifecycle.open(claimed).is_err());
        assert_eq!(lifecycle.close(), CloseOutcome::AlreadyClosed);
    }

    assert!(dispatcher.registry().is_empty());
    assert_eq!(dispatcher.open_connections(), 0);
}

#[tokio::test]
async fn test_dropping_lifecycle_releases_user() {
    let dispatcher = dispatcher();
    {
        let mut lifecycle = ConnectionLifecycle::new(dispatcher.clone());
        let _outbox = lifecycle.open(Some("u1")).unwrap();
        assert!(dispatcher.registry().is_online(&user("u1")));
    }

    assert!(!dispatcher.registry().is_online(&user("u1")));
    assert_eq!(dispatcher.open_connections(), 0);
}
