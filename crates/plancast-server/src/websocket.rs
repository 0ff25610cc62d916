//! WebSocket connection handling.

use crate::state::AppState;
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use plancast_types::ClientEvent;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum size for a single inbound event (16KB)
const MAX_EVENT_SIZE: usize = 16 * 1024;

pub async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) -> Result<()> {
    let (conn, mut outbox) = state.hub.register().await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Drain the hub outbox into the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(target: "plancast::ws", "Failed to serialize event for {}: {}", conn, e);
                    continue;
                }
            };
            if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
                debug!(
                    target: "plancast::ws",
                    "WebSocket send failed for {} (client likely disconnected): {}",
                    conn, e
                );
                break;
            }
        }
    });

    // Feed inbound events into the hub.
    let hub = state.hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => {
                    if text.len() > MAX_EVENT_SIZE {
                        warn!(
                            target: "plancast::ws",
                            "Event too large ({} bytes) from {}, max {} bytes",
                            text.len(),
                            conn,
                            MAX_EVENT_SIZE
                        );
                        continue;
                    }
                    match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => {
                            if let Err(e) = hub.handle_event(conn, event).await {
                                warn!(target: "plancast::ws", "Dropped event from {}: {}", conn, e);
                            }
                        }
                        Err(e) => {
                            // Malformed events are dropped, never fatal.
                            debug!(target: "plancast::ws", "Unparseable event from {}: {}", conn, e);
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    state.hub.clone().disconnect(conn).await;

    Ok(())
}
