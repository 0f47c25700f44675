//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::info::ServerInfo;
use crate::connection::PeerAcceptor;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Hands upgraded WebSocket peers to the server-side bridge connection.
    pub peer_acceptor: PeerAcceptor,
    /// Static facts reported by `GET /info`.
    pub info: Arc<ServerInfo>,
}
