//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_peer_socket;
use crate::app_state::AppState;

/// `GET /ws`: upgrade HTTP connection to WebSocket and attach it as a
/// bridge peer.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let acceptor = state.peer_acceptor.clone();

    ws.on_upgrade(move |socket| run_peer_socket(socket, acceptor))
}
