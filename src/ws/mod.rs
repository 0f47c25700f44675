//! WebSocket transport adapters.
//!
//! - [`handler`] / [`connection`]: server side. `GET /ws` upgrades and
//!   attaches the socket as a peer of the [`crate::connection::ServerConnection`].
//! - [`client`]: client side. A reconnecting `tokio-tungstenite` connector
//!   feeding a [`crate::connection::ClientConnection`].

pub mod client;
pub mod connection;
pub mod handler;
