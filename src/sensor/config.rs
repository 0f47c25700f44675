//! Where to poll sensor data from.
//!
//! Loaded either from a remote endpoint (`CONFIG_URL`) returning
//! `{"host": ..., "port": ..., "sensorPaths": [...]}` or from a local file
//! holding `{"sensorPaths": [...]}` with host and port from the environment.

use std::path::Path;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::error::BusError;

/// Sensor provider endpoint and the paths of its sensors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSourceConfig {
    /// Provider host name.
    pub host: String,
    /// Provider port.
    pub port: u16,
    /// One HTTP path per sensor, e.g. `/sensor/1`.
    pub sensor_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SensorsFile {
    #[serde(default)]
    sensor_paths: Vec<String>,
}

impl SensorSourceConfig {
    /// Loads the sensor source as directed by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the remote or local configuration cannot be
    /// read or parsed, or if it lists no sensors.
    pub async fn load(config: &ServiceConfig) -> Result<Self, BusError> {
        let source = match &config.config_url {
            Some(url) => {
                tracing::info!(%url, "loading sensor config from url");
                Self::from_url(url).await?
            }
            None => {
                tracing::info!(path = %config.sensors_config.display(), "using sensor config in local file");
                Self::from_file(
                    &config.sensors_config,
                    &config.provider_host,
                    config.provider_port,
                )?
            }
        };

        tracing::info!(
            host = %source.host,
            port = source.port,
            paths = ?source.sensor_paths,
            "sensor source configured"
        );
        Ok(source)
    }

    /// Reads `{"sensorPaths": [...]}` from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Io`] if the file cannot be read and
    /// [`BusError::Config`] if it is not valid JSON or lists no sensors.
    pub fn from_file(path: &Path, host: &str, port: u16) -> Result<Self, BusError> {
        let content = std::fs::read_to_string(path)?;
        let file: SensorsFile = serde_json::from_str(&content).map_err(|e| {
            BusError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        Self {
            host: host.to_string(),
            port,
            sensor_paths: file.sensor_paths,
        }
        .validated()
    }

    /// Fetches `{host, port, sensorPaths}` from `url`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Http`] on transport or decode failure and
    /// [`BusError::Config`] on a non-200 status or an empty sensor list.
    pub async fn from_url(url: &str) -> Result<Self, BusError> {
        let response = reqwest::get(url).await?;
        if response.status() != StatusCode::OK {
            return Err(BusError::Config(format!(
                "config request to {url} returned {}",
                response.status()
            )));
        }
        response.json::<Self>().await?.validated()
    }

    /// Full URL of every configured sensor.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.sensor_paths
            .iter()
            .map(|path| format!("http://{}:{}{}", self.host, self.port, path))
            .collect()
    }

    fn validated(self) -> Result<Self, BusError> {
        if self.sensor_paths.is_empty() {
            return Err(BusError::Config("no sensors configured".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let Ok(mut file) = tempfile::NamedTempFile::new() else {
            panic!("cannot create temp file");
        };
        if file.write_all(content.as_bytes()).is_err() {
            panic!("cannot write temp file");
        }
        file
    }

    #[test]
    fn reads_paths_from_local_file() {
        let file = write_file(r#"{"sensorPaths": ["/sensor/1", "/sensor/2"]}"#);
        let Ok(source) = SensorSourceConfig::from_file(file.path(), "provider", 8100) else {
            panic!("config rejected");
        };
        assert_eq!(
            source.urls(),
            vec![
                "http://provider:8100/sensor/1".to_string(),
                "http://provider:8100/sensor/2".to_string(),
            ]
        );
    }

    #[test]
    fn empty_sensor_list_is_an_error() {
        let file = write_file(r#"{"sensorPaths": []}"#);
        assert!(matches!(
            SensorSourceConfig::from_file(file.path(), "h", 1),
            Err(BusError::Config(_))
        ));

        let file = write_file("{}");
        assert!(SensorSourceConfig::from_file(file.path(), "h", 1).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = SensorSourceConfig::from_file(Path::new("/nonexistent/sensors.json"), "h", 1);
        assert!(matches!(result, Err(BusError::Io(_))));
    }

    #[test]
    fn remote_shape_deserializes() {
        let Ok(source) = serde_json::from_str::<SensorSourceConfig>(
            r#"{"host": "10.0.0.2", "port": 8100, "sensorPaths": ["/t"]}"#,
        ) else {
            panic!("remote config rejected");
        };
        assert_eq!(source.host, "10.0.0.2");
        assert_eq!(source.sensor_paths, vec!["/t".to_string()]);
    }
}
