//! Sensor reading as published on [`crate::bus::topic::SENSOR_VALUES`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BusError;

/// Geographic position of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// One measurement reported by a sensor provider.
///
/// The bus treats readings as opaque JSON; this type is the shape the
/// producer checks before publishing and consumers check after receiving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Measurement time in milliseconds since the Unix epoch.
    pub timestamp: f64,
    /// Unit of `value`, e.g. `"°C"`.
    pub unit: String,
    /// Measured value.
    pub value: f64,
    /// Where the sensor is.
    pub geolocation: Geolocation,
}

impl SensorReading {
    /// Validates a JSON value as a reading.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::InvalidReading`] if a field is missing or has the
    /// wrong type.
    pub fn from_value(value: Value) -> Result<Self, BusError> {
        serde_json::from_value(value).map_err(|e| BusError::InvalidReading(e.to_string()))
    }

    /// Overlay label, e.g. `"21.5 °C"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:.1} {}", self.value, self.unit)
    }
}

/// Decodes a published array of readings, skipping invalid entries.
#[must_use]
pub fn readings_from_value(value: &Value) -> Vec<SensorReading> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match SensorReading::from_value(entry.clone()) {
            Ok(reading) => Some(reading),
            Err(e) => {
                tracing::debug!(error = %e, "skipping invalid reading");
                None
            }
        })
        .collect()
}
