//! WebSocket route handler.

use crate::state::AppState;
use crate::websocket::handle_websocket;
use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use std::sync::Arc;

pub async fn upgrade(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    if let Err(e) = handle_websocket(socket, state).await {
        tracing::error!(target: "plancast::ws", "WebSocket error: {}", e);
    }
}
