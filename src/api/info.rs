//! `GET /info`: start time and version of the running service.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;

/// Service facts fixed at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// RFC 3339 start timestamp.
    pub start: String,
    /// Crate version.
    pub version: String,
}

impl ServerInfo {
    /// Captures the current time and the crate version.
    #[must_use]
    pub fn now() -> Self {
        Self {
            start: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `GET /info`: service start time and version.
pub async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.info.as_ref().clone()))
}

/// Info routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/info", get(info_handler))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::connection::peer_acceptor;

    #[tokio::test]
    async fn reports_start_and_version() {
        let (peer_acceptor, _incoming) = peer_acceptor();
        let info = ServerInfo {
            start: "2026-10-16T00:00:00+00:00".to_string(),
            version: "0.1.0".to_string(),
        };
        let app = routes().with_state(AppState {
            peer_acceptor,
            info: Arc::new(info),
        });

        let Ok(request) = Request::builder().uri("/info").body(Body::empty()) else {
            panic!("bad request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);

        let Ok(body) = to_bytes(response.into_body(), 1024).await else {
            panic!("cannot read body");
        };
        let Ok(json) = serde_json::from_slice::<Value>(&body) else {
            panic!("body is not json");
        };
        assert_eq!(
            json,
            serde_json::json!({"start": "2026-10-16T00:00:00+00:00", "version": "0.1.0"})
        );
    }
}
