//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparsable values fall back
//! to defaults, except `LISTEN_ADDR`, which must parse when set.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default port of the web server when neither `LISTEN_ADDR` nor
/// `WEBSERVER_PORT` is set.
pub const DEFAULT_PORT: u16 = 8101;

/// Top-level service configuration.
///
/// Loaded once at startup via [`ServiceConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address to bind the HTTP/WebSocket server to.
    pub listen_addr: SocketAddr,

    /// Directory served as static web root.
    pub webroot: PathBuf,

    /// Host of the sensor data provider.
    pub provider_host: String,

    /// Port of the sensor data provider.
    pub provider_port: u16,

    /// Local sensor configuration file (`{"sensorPaths": [...]}`).
    pub sensors_config: PathBuf,

    /// Optional URL serving `{host, port, sensorPaths}`; overrides the
    /// local file and the provider host/port when set.
    pub config_url: Option<String>,

    /// Cadence of sensor polling rounds.
    pub poll_interval: Duration,

    /// Timeout of a single sensor HTTP request.
    pub http_timeout: Duration,

    /// WebSocket URL a client-side bridge connects to.
    pub bridge_url: String,

    /// Delay between client reconnect attempts.
    pub reconnect_interval: Duration,
}

impl ServiceConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(addr) => addr.parse()?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], parse_env("WEBSERVER_PORT", DEFAULT_PORT))),
        };

        let webroot = PathBuf::from(env_or("WEBROOT", "webroot"));
        let provider_host = env_or("PROVIDER_HOST", "localhost");
        let provider_port = parse_env("PROVIDER_PORT", 8100);
        let sensors_config = PathBuf::from(env_or("SENSORS_CONFIG", "sensors.json"));
        let config_url = std::env::var("CONFIG_URL").ok().filter(|url| !url.is_empty());

        let poll_interval = Duration::from_millis(parse_env("POLL_INTERVAL_MS", 5_000));
        let http_timeout = Duration::from_millis(parse_env("HTTP_TIMEOUT_MS", 20_000));

        let bridge_url = env_or("BRIDGE_URL", &format!("ws://localhost:{DEFAULT_PORT}/ws"));
        let reconnect_interval = Duration::from_millis(parse_env("RECONNECT_INTERVAL_MS", 1_000));

        Ok(Self {
            listen_addr,
            webroot,
            provider_host,
            provider_port,
            sensors_config,
            config_url,
            poll_interval,
            http_timeout,
            bridge_url,
            reconnect_interval,
        })
    }
}

/// Filter directive for `tracing-subscriber`: `RUST_LOG` wins, then
/// `LOG_LEVEL` (`DEBUG`, `INFO`, ...), then `info`.
#[must_use]
pub fn log_filter() -> String {
    std::env::var("RUST_LOG")
        .ok()
        .or_else(|| std::env::var("LOG_LEVEL").ok().map(|level| level.to_lowercase()))
        .unwrap_or_else(|| "info".to_string())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: u64 = parse_env("SENSOR_BUS_TEST_SURELY_UNSET", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn env_or_falls_back_on_missing_key() {
        assert_eq!(env_or("SENSOR_BUS_TEST_SURELY_UNSET", "dflt"), "dflt");
    }
}
