//! # sensor-bus
//!
//! Publish/subscribe bus bridged over WebSocket, feeding periodically polled
//! sensor readings to a browser map overlay.
//!
//! A local [`bus::Bus`] delivers publications and commands synchronously and
//! replays the last publication to late subscribers. A [`bridge::BusBridge`]
//! extends a bus across a process boundary through a
//! [`connection::Connection`]: a single-peer client or a multi-peer server
//! that catches late peers up with the latest value of every topic.
//!
//! ## Architecture
//!
//! ```text
//! DataPoller (sensor/)
//!     │ publish(/shared/sensorValues)
//!     ├── Bus (bus/)
//!     │
//!     ├── BusBridge (bridge)
//!     ├── ServerConnection / ClientConnection (connection/)
//!     │
//!     └── WebSocket adapters (ws/) ── axum /ws, tokio-tungstenite client
//!             │
//!             └── remote BusBridge → remote Bus → subscribers
//! ```

pub mod api;
pub mod app_state;
pub mod bridge;
pub mod bus;
pub mod config;
pub mod connection;
pub mod error;
pub mod sensor;
pub mod ws;
