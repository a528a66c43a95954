//! Integration tests for the realtime client against an in-process
//! WebSocket server.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use boxoffice_client::realtime::NewBooking;
use boxoffice_client::{ConnectionState, RealtimeClient, RealtimeConfig, RealtimeError, RealtimeEvent};
use boxoffice_runtime::{SessionContext, keys};
use boxoffice_testing::helpers;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::{WebSocketStream, accept_async, accept_hdr_async};

const WAIT: Duration = Duration::from_secs(5);

async fn listen() -> (TcpListener, RealtimeConfig) {
    helpers::init_test_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let mut config = RealtimeConfig::new(url);
    config.reconnect_delay = Duration::from_millis(50);
    (listener, config)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    accept_async(stream).await.unwrap()
}

async fn next_frame(socket: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let message = timeout(WAIT, socket.next()).await.unwrap().unwrap().unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn push(socket: &mut WebSocketStream<TcpStream>, frame: Value) {
    socket.send(Message::Text(frame.to_string())).await.unwrap();
}

async fn wait_for(state: &mut watch::Receiver<ConnectionState>, wanted: ConnectionState) {
    timeout(WAIT, state.wait_for(|s| *s == wanted)).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_token_is_sent_on_connect() {
    let (listener, config) = listen().await;
    let context = Arc::new(SessionContext::default());

    let client = RealtimeClient::connect(&config, "tok-123", context).unwrap();

    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let (uri_tx, uri_rx) = oneshot::channel();
    let capture = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let _ = uri_tx.send(request.uri().to_string());
        Ok(response)
    };
    let _socket = accept_hdr_async(stream, capture).await.unwrap();

    assert_eq!(uri_rx.await.unwrap(), "/?token=tok-123");
    client.disconnect().await;
}

#[tokio::test]
async fn test_events_are_broadcast_and_invalidate_cache() {
    let (listener, config) = listen().await;
    let context = Arc::new(SessionContext::default());
    context.cache().set(keys::campaigns::detail("cmp_1"), json!({})).await;
    context.cache().set(keys::bookings::by_campaign("cmp_1"), json!([])).await;

    let client = RealtimeClient::connect(&config, "tok", Arc::clone(&context)).unwrap();
    let mut events = client.subscribe();
    client.join_campaign("cmp_1").unwrap();

    let mut socket = accept(&listener).await;
    assert_eq!(
        next_frame(&mut socket).await,
        json!({ "event": "join:campaign", "data": "cmp_1" })
    );

    push(&mut socket, json!({ "event": "chat:message", "data": { "text": "hi" } })).await;
    push(
        &mut socket,
        json!({ "event": "booking:new", "data": { "campaignId": "cmp_1", "campaignName": "Nile Nights" } }),
    )
    .await;

    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(
        event,
        RealtimeEvent::BookingNew(NewBooking {
            booking_id: None,
            campaign_id: Some("cmp_1".to_string()),
            campaign_name: Some("Nile Nights".to_string()),
        })
    );
    assert!(context.cache().get(&keys::campaigns::detail("cmp_1")).await.is_none());
    assert!(context.cache().get(&keys::bookings::by_campaign("cmp_1")).await.is_none());

    client.leave_campaign("cmp_1").unwrap();
    assert_eq!(
        next_frame(&mut socket).await,
        json!({ "event": "leave:campaign", "data": "cmp_1" })
    );

    client.disconnect().await;
}

#[tokio::test]
async fn test_reconnect_rejoins_rooms() {
    let (listener, config) = listen().await;
    let client = RealtimeClient::connect(&config, "tok", Arc::new(SessionContext::default())).unwrap();
    let mut state = client.watch_state();
    client.join_campaign("cmp_1").unwrap();
    client.join_campaign("cmp_2").unwrap();

    let mut first = accept(&listener).await;
    next_frame(&mut first).await;
    next_frame(&mut first).await;
    wait_for(&mut state, ConnectionState::Connected).await;
    drop(first);

    let mut second = accept(&listener).await;
    let mut rejoined = vec![next_frame(&mut second).await, next_frame(&mut second).await];
    rejoined.sort_by_key(ToString::to_string);
    assert_eq!(
        rejoined,
        vec![
            json!({ "event": "join:campaign", "data": "cmp_1" }),
            json!({ "event": "join:campaign", "data": "cmp_2" }),
        ]
    );
    wait_for(&mut state, ConnectionState::Connected).await;

    client.disconnect().await;
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let (listener, mut config) = listen().await;
    config.max_reconnect_attempts = 2;
    config.reconnect_delay = Duration::from_millis(10);
    // Nothing listens on this port any more.
    drop(listener);

    let client = RealtimeClient::connect(&config, "tok", Arc::new(SessionContext::default())).unwrap();
    let mut state = client.watch_state();

    wait_for(&mut state, ConnectionState::Failed).await;
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let (listener, config) = listen().await;
    let client = RealtimeClient::connect(&config, "tok", Arc::new(SessionContext::default())).unwrap();
    let mut socket = accept(&listener).await;

    assert!(client.disconnect().await);
    assert!(!client.disconnect().await);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.join_campaign("cmp_1"), Err(RealtimeError::Closed));

    // The server side ends once the client has gone.
    timeout(WAIT, async { while let Some(Ok(_)) = socket.next().await {} })
        .await
        .unwrap();
}

#[test]
fn test_rejects_non_websocket_url() {
    let config = RealtimeConfig::new("https://api.example.com");
    let result = RealtimeClient::connect(&config, "tok", Arc::new(SessionContext::default()));
    assert!(matches!(result, Err(RealtimeError::InvalidUrl(_))));
}
