//! Crate error type.
//!
//! [`BusError`] covers the fallible edges of the service: envelope
//! (de)serialization, configuration loading, sensor polling and the
//! transport. The bus core and the connections' `send` paths never return
//! it; they log and drop instead.

/// Errors raised outside the fire-and-forget bus paths.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// An inbound frame is not a valid envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// An envelope payload could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    /// A sensor returned data that is not a valid reading.
    #[error("invalid sensor reading: {0}")]
    InvalidReading(String),

    /// Configuration is missing or unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request to a sensor or the configuration endpoint failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local I/O failure (config file, listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = BusError::Config("no sensors configured".to_string());
        assert_eq!(err.to_string(), "configuration error: no sensors configured");

        let err = BusError::InvalidReading("missing unit".to_string());
        assert_eq!(err.to_string(), "invalid sensor reading: missing unit");
    }

    #[test]
    fn io_errors_convert() {
        let err: BusError = std::io::Error::other("boom").into();
        assert!(matches!(err, BusError::Io(_)));
    }
}
