//! WebSocket transport integration tests
//!
//! Each test serves the router on a random local port and talks to `/ws`
//! with a real client.

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use chatpulse::backend::server::AppState;
use chatpulse::shared::ChatMessage;

use crate::common::{test_app, user, FakeStore};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_test_server() -> (SocketAddr, AppState) {
    let (state, router) = test_app(FakeStore::new(true, true));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, state)
}

async fn connect(addr: SocketAddr, query: &str) -> Client {
    let url = format!("ws://{}/ws{}", addr, query);
    let (client, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("Failed to connect to WebSocket");
    client
}

/// Next non-control message within two seconds
async fn next_message(client: &mut Client) -> Message {
    loop {
        let received = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("Expected a message within timeout")
            .expect("Stream ended unexpectedly")
            .expect("WebSocket error");
        match received {
            Message::Ping(_) | Message::Pong(_) => continue,
            other => return other,
        }
    }
}

async fn next_event(client: &mut Client) -> serde_json::Value {
    match next_message(client).await {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("Expected text frame, got: {:?}", other),
    }
}

async fn next_online(client: &mut Client) -> Vec<String> {
    let event = next_event(client).await;
    assert_eq!(event["event"], "presence-changed");
    serde_json::from_value(event["payload"].clone()).unwrap()
}

/// Poll until `condition` holds or two seconds pass
async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Condition not reached within timeout");
}

async fn expect_rejected(client: &mut Client) {
    match next_message(client).await {
        Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::from(4001)),
        other => panic!("Expected close frame with code 4001, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_user_id_is_closed_with_4001() {
    let (addr, state) = start_test_server().await;

    let mut client = connect(addr, "").await;
    expect_rejected(&mut client).await;

    assert!(state.registry.is_empty());
    assert_eq!(state.dispatcher.open_connections(), 0);
}

#[tokio::test]
async fn test_invalid_user_id_is_closed_with_4001() {
    let (addr, state) = start_test_server().await;

    for query in ["?userId=", "?userId=undefined", "?userId=%20u1"] {
        let mut client = connect(addr, query).await;
        expect_rejected(&mut client).await;
    }

    assert!(state.registry.is_empty());
}

#[tokio::test]
async fn test_connect_receives_own_presence() {
    let (addr, state) = start_test_server().await;

    let mut client = connect(addr, "?userId=u1").await;
    assert_eq!(next_online(&mut client).await, vec!["u1"]);
    assert!(state.registry.is_online(&user("u1")));
}

#[tokio::test]
async fn test_client_close_shrinks_presence_for_others() {
    let (addr, state) = start_test_server().await;

    let mut first = connect(addr, "?userId=u1").await;
    assert_eq!(next_online(&mut first).await, vec!["u1"]);

    let mut second = connect(addr, "?userId=u2").await;
    assert_eq!(next_online(&mut first).await, vec!["u1", "u2"]);
    assert_eq!(next_online(&mut second).await, vec!["u1", "u2"]);

    first.close(None).await.unwrap();
    assert_eq!(next_online(&mut second).await, vec!["u2"]);
    assert!(!state.registry.is_online(&user("u1")));
}

#[tokio::test]
async fn test_superseded_socket_close_is_silent() {
    let (addr, state) = start_test_server().await;

    let mut old = connect(addr, "?userId=u3").await;
    assert_eq!(next_online(&mut old).await, vec!["u3"]);

    let mut new = connect(addr, "?userId=u3").await;
    assert_eq!(next_online(&mut new).await, vec!["u3"]);
    wait_for(|| state.dispatcher.open_connections() == 2).await;

    old.close(None).await.unwrap();
    wait_for(|| state.dispatcher.open_connections() == 1).await;

    assert!(state.registry.is_online(&user("u3")));
    let extra = tokio::time::timeout(Duration::from_millis(300), new.next()).await;
    assert!(extra.is_err(), "Expected no broadcast after stale close, got {:?}", extra);
}

#[tokio::test]
async fn test_directed_message_reaches_socket() {
    let (addr, state) = start_test_server().await;

    let mut client = connect(addr, "?userId=u2").await;
    let _ = next_online(&mut client).await;

    let message = ChatMessage::new(user("u1"), user("u2"), "hello over the wire").unwrap();
    assert!(state.dispatcher.deliver_to(&user("u2"), message).is_delivered());

    let event = next_event(&mut client).await;
    assert_eq!(event["event"], "message-delivered");
    assert_eq!(event["payload"]["sender"], "u1");
    assert_eq!(event["payload"]["text"], "hello over the wire");
}
