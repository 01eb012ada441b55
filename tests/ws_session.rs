//! End-to-end matching session over real WebSockets.
//!
//! Boots the full axum app on an ephemeral port and drives a driver, a
//! user, and the matcher through the registration, match, and booking
//! handshake.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use dispatch_gateway::api;
use dispatch_gateway::app_state::AppState;
use dispatch_gateway::domain::ProfileDirectory;
use dispatch_gateway::service::{MatchService, UniformArrival};
use dispatch_gateway::ws::Dispatcher;
use dispatch_gateway::ws::handler::ws_handler;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn spawn_server() -> std::net::SocketAddr {
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(ProfileDirectory::sample()),
        MatchService::new(Arc::new(UniformArrival::default())),
        Duration::from_secs(30),
    ));
    let app = Router::new()
        .merge(api::routes())
        .route("/ws", get(ws_handler))
        .with_state(AppState { dispatcher });

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("failed to read listener address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: std::net::SocketAddr) -> WsClient {
    let Ok((ws, _response)) = connect_async(format!("ws://{addr}/ws")).await else {
        panic!("websocket connect failed");
    };
    ws
}

async fn send_json(ws: &mut WsClient, frame: &Value) {
    let Ok(()) = ws.send(Message::text(frame.to_string())).await else {
        panic!("websocket send failed");
    };
}

async fn recv_frame(ws: &mut WsClient) -> Value {
    loop {
        let next = tokio::time::timeout(RECV_TIMEOUT, ws.next()).await;
        let Ok(Some(Ok(message))) = next else {
            panic!("websocket closed or timed out");
        };
        if let Message::Text(text) = message {
            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                panic!("non-JSON frame: {text}");
            };
            return value;
        }
    }
}

/// Reads frames until one with the wanted `type` arrives, skipping
/// interleaved pool updates and acks.
async fn recv_of_type(ws: &mut WsClient, wanted: &str) -> Value {
    for _ in 0..16 {
        let frame = recv_frame(ws).await;
        if frame.get("type").and_then(Value::as_str) == Some(wanted) {
            return frame;
        }
    }
    panic!("never received a {wanted} frame");
}

fn field_str<'a>(frame: &'a Value, key: &str) -> &'a str {
    let Some(value) = frame.get(key).and_then(Value::as_str) else {
        panic!("frame missing string field {key}: {frame}");
    };
    value
}

fn field_u64(frame: &Value, key: &str) -> u64 {
    let Some(value) = frame.get(key).and_then(Value::as_u64) else {
        panic!("frame missing numeric field {key}: {frame}");
    };
    value
}

#[tokio::test]
async fn full_matching_session_over_websocket() {
    let addr = spawn_server().await;

    // Driver d-10234 registers and is greeted first.
    let mut driver = connect(addr).await;
    let greeting = recv_of_type(&mut driver, "connection_established").await;
    assert!(field_str(&greeting, "connectionId").len() > 10);
    send_json(
        &mut driver,
        &serde_json::json!({"type": "driver_register", "driverId": "d-10234"}),
    )
    .await;
    let ack = recv_of_type(&mut driver, "registration_success").await;
    let Some(pool) = ack.get("pool") else {
        panic!("registration ack missing pool counts");
    };
    assert_eq!(field_u64(pool, "driversCount"), 1);

    // User u-20457 registers.
    let mut user = connect(addr).await;
    send_json(
        &mut user,
        &serde_json::json!({"type": "user_register", "userId": "u-20457"}),
    )
    .await;
    let _ack = recv_of_type(&mut user, "registration_success").await;

    // The matcher registers and immediately sees both parties.
    let mut matcher = connect(addr).await;
    send_json(&mut matcher, &serde_json::json!({"type": "matcher_register"})).await;
    let pool_update = recv_of_type(&mut matcher, "pool_update").await;
    let drivers = pool_update
        .get("availableDrivers")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let users = pool_update
        .get("availableUsers")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    assert_eq!((drivers, users), (1, 1));

    // Manual match request pairs them.
    send_json(
        &mut matcher,
        &serde_json::json!({
            "type": "match_request",
            "userId": "u-20457",
            "driverId": "d-10234"
        }),
    )
    .await;
    let result = recv_of_type(&mut matcher, "match_result").await;
    assert_eq!(result.get("success").and_then(Value::as_bool), Some(true));

    // The user receives the proposal with the driver's public profile.
    let booking = recv_of_type(&mut user, "booking_request").await;
    assert_eq!(field_str(&booking, "driverId"), "d-10234");
    assert_eq!(field_str(&booking, "driverName"), "Rajesh Kumar");
    assert_eq!(field_u64(&booking, "estimatedFare"), 220);
    let eta = field_u64(&booking, "estimatedArrival");
    assert!((3..=8).contains(&eta), "eta {eta} out of bounds");
    let ride_id = field_str(&booking, "rideId").to_string();
    assert!(ride_id.starts_with("ride-"));

    // The user accepts; the driver is notified with the rider's profile.
    send_json(
        &mut user,
        &serde_json::json!({
            "type": "booking_response",
            "rideId": ride_id,
            "response": "accept"
        }),
    )
    .await;

    let accepted = recv_of_type(&mut driver, "ride_accepted").await;
    assert_eq!(field_str(&accepted, "rideId"), ride_id);
    let Some(rider) = accepted.get("user") else {
        panic!("ride_accepted missing rider profile");
    };
    assert_eq!(field_str(rider, "id"), "u-20457");
    assert_eq!(field_u64(&accepted, "estimatedFare"), 220);

    let processed = recv_of_type(&mut user, "booking_processed").await;
    assert_eq!(field_str(&processed, "status"), "accepted");

    // The observer's next snapshot shows an empty pool and the settlement.
    let settled = recv_of_type(&mut matcher, "pool_update").await;
    let drivers = settled
        .get("availableDrivers")
        .and_then(Value::as_array)
        .map_or(usize::MAX, Vec::len);
    let users = settled
        .get("availableUsers")
        .and_then(Value::as_array)
        .map_or(usize::MAX, Vec::len);
    assert_eq!((drivers, users), (0, 0));
    let Some(info) = settled.get("matchInfo") else {
        panic!("settled pool update missing matchInfo");
    };
    assert_eq!(field_str(info, "status"), "accepted");
    assert_eq!(field_str(info, "rideId"), ride_id);
}

#[tokio::test]
async fn match_request_for_absent_parties_fails_cleanly() {
    let addr = spawn_server().await;

    let mut matcher = connect(addr).await;
    send_json(&mut matcher, &serde_json::json!({"type": "matcher_register"})).await;
    let _initial = recv_of_type(&mut matcher, "pool_update").await;

    send_json(
        &mut matcher,
        &serde_json::json!({
            "type": "match_request",
            "userId": "u-20456",
            "driverId": "d-10234"
        }),
    )
    .await;
    let result = recv_of_type(&mut matcher, "match_result").await;
    assert_eq!(result.get("success").and_then(Value::as_bool), Some(false));
    assert!(field_str(&result, "message").contains("not in active pool"));

    // The observer connection survives the failure.
    send_json(
        &mut matcher,
        &serde_json::json!({"type": "nonsense_frame"}),
    )
    .await;
    let err = recv_of_type(&mut matcher, "error").await;
    assert!(field_str(&err, "message").contains("unknown message type"));
}
