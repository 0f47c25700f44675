//! Periodic sensor poller: the producer feeding the bus.
//!
//! Every round queries all sensor URLs concurrently, keeps the valid
//! readings and publishes them as one array on
//! [`SENSOR_VALUES`](crate::bus::topic::SENSOR_VALUES). A round that yields
//! nothing still publishes an empty array, so consumers drop stale overlays.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::reading::SensorReading;
use crate::bus::Bus;
use crate::bus::topic::SENSOR_VALUES;
use crate::error::BusError;

/// Result of querying one sensor.
#[derive(Debug)]
enum PollOutcome {
    Reading(SensorReading),
    NoContent,
}

/// Polls a fixed set of sensor URLs on a fixed cadence.
#[derive(Debug, Clone)]
pub struct DataPoller {
    client: reqwest::Client,
    urls: Vec<String>,
    interval: Duration,
}

impl DataPoller {
    /// Creates a poller for `urls`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Http`] if the HTTP client cannot be built.
    pub fn new(urls: Vec<String>, interval: Duration, timeout: Duration) -> Result<Self, BusError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            urls,
            interval,
        })
    }

    /// Runs one polling round and returns the valid readings in URL order.
    pub async fn poll_once(&self) -> Vec<SensorReading> {
        let outcomes = join_all(self.urls.iter().map(|url| self.poll(url))).await;

        let mut readings = Vec::with_capacity(outcomes.len());
        for (url, outcome) in self.urls.iter().zip(outcomes) {
            match outcome {
                Ok(PollOutcome::Reading(reading)) => readings.push(reading),
                Ok(PollOutcome::NoContent) => {
                    tracing::info!(%url, "currently no data available");
                }
                Err(e) => tracing::error!(%url, error = %e, "failed to poll sensor data"),
            }
        }
        readings
    }

    /// Spawns the polling loop, publishing every round on `bus`.
    ///
    /// Rounds start at the configured cadence; a slow round delays the next
    /// one instead of bunching them up.
    #[must_use]
    pub fn spawn(self, bus: Arc<Bus>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let readings = self.poll_once().await;
                tracing::debug!(count = readings.len(), "publishing sensor values");
                match serde_json::to_value(&readings) {
                    Ok(value) => bus.publish(SENSOR_VALUES, value),
                    Err(e) => tracing::error!(error = %e, "failed to serialize sensor values"),
                }
            }
        })
    }

    async fn poll(&self, url: &str) -> Result<PollOutcome, BusError> {
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let body: Value = response.json().await?;
                SensorReading::from_value(body).map(PollOutcome::Reading)
            }
            StatusCode::NO_CONTENT => Ok(PollOutcome::NoContent),
            status => Err(BusError::InvalidReading(format!("unexpected status {status}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::get;
    use axum::{Json, serve};
    use serde_json::json;

    use super::*;

    async fn provider() -> String {
        let app = Router::new()
            .route(
                "/ok",
                get(|| async {
                    Json(json!({
                        "timestamp": 1_700_000_000_000_i64,
                        "unit": "°C",
                        "value": 19.0,
                        "geolocation": {"latitude": 1.0, "longitude": 2.0}
                    }))
                }),
            )
            .route("/empty", get(|| async { HttpStatus::NO_CONTENT }))
            .route("/broken", get(|| async { HttpStatus::INTERNAL_SERVER_ERROR }))
            .route("/garbage", get(|| async { Json(json!({"unit": 3})) }));

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("cannot bind");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn keeps_only_valid_readings() {
        let base = provider().await;
        let urls = ["/ok", "/empty", "/broken", "/garbage", "/ok"]
            .iter()
            .map(|path| format!("{base}{path}"))
            .collect();
        let Ok(poller) = DataPoller::new(urls, Duration::from_secs(5), Duration::from_secs(2))
        else {
            panic!("client build failed");
        };

        let readings = poller.poll_once().await;
        assert_eq!(readings.len(), 2);
        assert!(readings.iter().all(|r| r.label() == "19.0 °C"));
    }

    #[tokio::test]
    async fn spawned_poller_publishes_on_sensor_topic() {
        let base = provider().await;
        let Ok(poller) = DataPoller::new(
            vec![format!("{base}/ok")],
            Duration::from_millis(50),
            Duration::from_secs(2),
        ) else {
            panic!("client build failed");
        };

        let bus = Arc::new(Bus::new());
        let task = poller.spawn(Arc::clone(&bus));
        let mut published = None;
        for _ in 0..100 {
            published = bus.last_published(SENSOR_VALUES);
            if published.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        task.abort();

        let Some(Value::Array(values)) = published else {
            panic!("nothing published");
        };
        assert_eq!(values.len(), 1);
    }
}
