//! sensor-bus server entry point.
//!
//! Polls the configured sensors, publishes their readings on the local bus
//! and bridges that bus to every browser attached on `/ws`.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sensor_bus::api;
use sensor_bus::api::info::ServerInfo;
use sensor_bus::app_state::AppState;
use sensor_bus::bridge::BusBridge;
use sensor_bus::bus::Bus;
use sensor_bus::bus::topic::SENSOR_VALUES;
use sensor_bus::config::{ServiceConfig, log_filter};
use sensor_bus::connection::{ServerConnection, peer_acceptor};
use sensor_bus::sensor::{DataPoller, SensorSourceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServiceConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(log_filter()).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let info = ServerInfo::now();
    tracing::info!(version = %info.version, addr = %config.listen_addr, "starting sensor-bus");

    // Bus and its bridge to the browsers
    let bus = Arc::new(Bus::new());
    let (acceptor, incoming) = peer_acceptor();
    let _bridge = BusBridge::<ServerConnection>::server(Arc::clone(&bus), [SENSOR_VALUES], incoming);

    // Producer
    let source = SensorSourceConfig::load(&config).await?;
    let poller = DataPoller::new(source.urls(), config.poll_interval, config.http_timeout)?;
    let _poller = poller.spawn(Arc::clone(&bus));

    // Build application state
    let app_state = AppState {
        peer_acceptor: acceptor,
        info: Arc::new(info),
    };

    // Build router
    let app = api::build_router(&config.webroot)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, webroot = %config.webroot.display(), "web server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
