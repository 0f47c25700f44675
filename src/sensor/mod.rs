//! Sensor collaborator: reading model, source configuration and poller.
//!
//! The bus core never looks inside published values; this module is where
//! the sensor-reading shape is produced and checked.

pub mod config;
pub mod poller;
pub mod reading;

pub use config::SensorSourceConfig;
pub use poller::DataPoller;
pub use reading::{Geolocation, SensorReading, readings_from_value};
