//! WebSocket endpoint: join handshake and live status forwarding.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};

use vhub_models::{StatusEvent, WsJoinRequest, WsMessage};
use vhub_notify::ConnectionId;

use crate::metrics;
use crate::state::AppState;

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Buffered events per connection before the bus sees backpressure.
const WS_SEND_BUFFER_SIZE: usize = 32;
const WS_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const WS_JOIN_TIMEOUT: Duration = Duration::from_secs(60);

/// WebSocket updates endpoint.
pub async fn ws_updates(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection();

    ws.on_upgrade(|socket| async move {
        handle_updates_socket(socket, state).await;
        let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_ws_active_connections(count);
    })
}

/// Drive one connection: join handshake, then event forwarding until
/// disconnect.
async fn handle_updates_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // First message must be the join handshake, within a deadline.
    let token = match tokio::time::timeout(WS_JOIN_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<WsJoinRequest>(&text) {
            Ok(WsJoinRequest::Join { token }) => token,
            Err(e) => {
                send_message(&mut sender, &WsMessage::error(format!("Invalid join request: {}", e)))
                    .await;
                return;
            }
        },
        Ok(_) | Err(_) => {
            send_message(
                &mut sender,
                &WsMessage::error("Expected a join message or connection timed out"),
            )
            .await;
            return;
        }
    };

    let mut tenant_id = match state.jwt.verify(&token) {
        Ok(claims) => claims.sub,
        Err(e) => {
            send_message(&mut sender, &WsMessage::error(format!("Authentication failed: {}", e)))
                .await;
            return;
        }
    };

    let connection_id = ConnectionId::new();
    let (tx, mut rx) = mpsc::channel::<StatusEvent>(WS_SEND_BUFFER_SIZE);

    state.registry.join(&tenant_id, connection_id, tx.clone()).await;
    info!(connection = %connection_id, tenant = %tenant_id, "WebSocket joined");

    // Deregister no matter how the forwarding loop exits.
    let registry = state.registry.clone();
    let _guard = scopeguard::guard((), move |_| {
        tokio::spawn(async move {
            registry.leave(connection_id).await;
        });
    });

    if !send_message(&mut sender, &WsMessage::joined(&tenant_id)).await {
        return;
    }

    let mut heartbeat = interval(WS_HEARTBEAT_INTERVAL);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // Status event from the pipeline
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        if !send_message(&mut sender, &WsMessage::update(&event)).await {
                            warn!(connection = %connection_id, "WebSocket send failed, client disconnected");
                            break;
                        }
                    }
                    None => break,
                }
            }
            // Heartbeat to keep the connection alive
            _ = heartbeat.tick() => {
                if last_activity.elapsed() > WS_HEARTBEAT_INTERVAL / 2 {
                    if sender.send(Message::Ping(vec![])).await.is_err() {
                        warn!(connection = %connection_id, "Heartbeat failed, client disconnected");
                        break;
                    }
                }
            }
            // Client messages: pongs, re-joins, close
            client_msg = receiver.next() => {
                match client_msg {
                    Some(Ok(Message::Pong(_))) => {
                        last_activity = Instant::now();
                    }
                    Some(Ok(Message::Text(text))) => {
                        last_activity = Instant::now();
                        if let Ok(WsJoinRequest::Join { token }) = serde_json::from_str(&text) {
                            match state.jwt.verify(&token) {
                                Ok(claims) => {
                                    // Re-home the connection; a join under a new
                                    // identity replaces the previous mapping.
                                    tenant_id = claims.sub;
                                    state
                                        .registry
                                        .join(&tenant_id, connection_id, tx.clone())
                                        .await;
                                    if !send_message(&mut sender, &WsMessage::joined(&tenant_id)).await {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    send_message(
                                        &mut sender,
                                        &WsMessage::error(format!("Authentication failed: {}", e)),
                                    )
                                    .await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(connection = %connection_id, "Client closed connection");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.registry.leave(connection_id).await;
    info!(connection = %connection_id, tenant = %tenant_id, "WebSocket ended");
}

/// Serialize and send one message; false when the client is gone.
async fn send_message(
    sender: &mut (impl SinkExt<Message> + Unpin),
    message: &WsMessage,
) -> bool {
    let Ok(json) = serde_json::to_string(message) else {
        return false;
    };
    sender.send(Message::Text(json)).await.is_ok()
}
