//! WebSocket connection loop.
//!
//! Runs the read/write loop for a single connection: inbound text frames
//! go to the dispatcher, outbound frames drain from the connection's
//! unbounded queue into the socket sink.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::dispatcher::{ClientSession, Dispatcher};
use super::messages::ServerMessage;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Greets the client with `connection_established`.
/// - Feeds inbound text frames to the [`Dispatcher`].
/// - Forwards queued [`ServerMessage`]s to the socket.
/// - On close, runs the dispatcher's disconnect cleanup.
pub async fn run_connection(socket: WebSocket, dispatcher: Arc<Dispatcher>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (queue_tx, mut queue_rx) = mpsc::unbounded_channel();
    let mut session = ClientSession::new(queue_tx);

    tracing::info!(conn_id = %session.conn_id(), "new connection");
    session.send(ServerMessage::ConnectionEstablished {
        message: "Connected to ride-matching service".to_string(),
        connection_id: session.conn_id(),
    });

    loop {
        tokio::select! {
            // Incoming frame from the client
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        dispatcher.handle_text(&mut session, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            // Outbound frame queued by a handler
            outbound = queue_rx.recv() => {
                match outbound {
                    Some(message) => {
                        let json = serde_json::to_string(&message).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    dispatcher.handle_disconnect(&session).await;
    tracing::debug!(conn_id = %session.conn_id(), "connection loop finished");
}
