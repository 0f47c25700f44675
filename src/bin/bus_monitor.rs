//! bus-monitor: headless consumer of a sensor-bus server.
//!
//! Attaches a client-side bridge to `BRIDGE_URL` and logs every sensor
//! reading the way the browser overlay would label it, plus bridge
//! connection-state changes.

use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::EnvFilter;

use sensor_bus::bridge::BusBridge;
use sensor_bus::bus::Bus;
use sensor_bus::bus::topic::{BRIDGE_CONNECTED, SENSOR_VALUES};
use sensor_bus::config::{ServiceConfig, log_filter};
use sensor_bus::connection::ClientConnection;
use sensor_bus::sensor::readings_from_value;
use sensor_bus::ws::client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(log_filter()).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bus = Arc::new(Bus::new());

    bus.subscribe_to_publication(BRIDGE_CONNECTED, |connected: &Value| {
        tracing::info!(connected = connected.as_bool().unwrap_or(false), "bridge state");
    });
    bus.subscribe_to_publication(SENSOR_VALUES, |values: &Value| {
        let readings = readings_from_value(values);
        tracing::info!(count = readings.len(), "sensor values");
        for reading in readings {
            tracing::info!(
                latitude = reading.geolocation.latitude,
                longitude = reading.geolocation.longitude,
                "{}",
                reading.label()
            );
        }
    });

    let (channel, transport) = client::connect(config.bridge_url.as_str(), config.reconnect_interval);
    let _bridge = BusBridge::<ClientConnection>::client(Arc::clone(&bus), Vec::<String>::new(), channel);
    tracing::info!(url = %config.bridge_url, "monitoring bus");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
        _ = transport => tracing::warn!("transport task ended"),
    }

    Ok(())
}
