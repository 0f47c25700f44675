//! HTTP layer: info endpoint, bridge WebSocket and static web root.

pub mod info;

use std::path::Path;

use axum::Router;
use axum::routing::get;
use tower_http::services::ServeDir;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the router: `GET /info`, `GET /ws`, and every other path served
/// from `webroot` (`index.html` for directories).
pub fn build_router(webroot: &Path) -> Router<AppState> {
    Router::new()
        .merge(info::routes())
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(webroot).append_index_html_on_directories(true))
}
