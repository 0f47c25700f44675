//! Connections: one bidirectional, message-oriented channel per bridge.
//!
//! A [`Connection`] sends [`Envelope`]s and reports connect, disconnect and
//! inbound messages through [`ConnectionCallbacks`]. Two variants exist:
//!
//! - [`ClientConnection`]: one socket to one remote server, lossy while
//!   disconnected.
//! - [`ServerConnection`]: any number of attached peers, broadcast on send,
//!   catch-up replay for peers attaching late.
//!
//! Both dispatch their callbacks from a single event-loop task, so callbacks
//! of one connection never overlap and arrive in transport order.

pub mod client;
pub mod replay;
pub mod server;
pub mod transport;

use std::fmt;
use std::sync::Arc;

pub use client::ClientConnection;
pub use server::ServerConnection;
pub use transport::{
    ClientChannel, ClientEvent, ClientSocket, PeerAcceptor, PeerChannel, PeerIncoming, PeerSocket,
    client_channel, peer_acceptor, peer_channel,
};

use crate::bus::Envelope;

/// A bidirectional channel carrying envelopes.
pub trait Connection: Send + Sync + 'static {
    /// Transmits `envelope`. Never blocks and never reports failure;
    /// undeliverable messages are dropped.
    fn send(&self, envelope: &Envelope);
}

type Notify = Arc<dyn Fn() + Send + Sync>;
type OnMessage = Arc<dyn Fn(Envelope) + Send + Sync>;

/// The three callbacks a connection drives.
#[derive(Clone)]
pub struct ConnectionCallbacks {
    on_connect: Notify,
    on_disconnect: Notify,
    on_message: OnMessage,
}

impl fmt::Debug for ConnectionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCallbacks").finish_non_exhaustive()
    }
}

impl ConnectionCallbacks {
    /// Bundles connect, disconnect and message callbacks.
    pub fn new<C, D, M>(on_connect: C, on_disconnect: D, on_message: M) -> Self
    where
        C: Fn() + Send + Sync + 'static,
        D: Fn() + Send + Sync + 'static,
        M: Fn(Envelope) + Send + Sync + 'static,
    {
        Self {
            on_connect: Arc::new(on_connect),
            on_disconnect: Arc::new(on_disconnect),
            on_message: Arc::new(on_message),
        }
    }

    pub(crate) fn connected(&self) {
        (self.on_connect)();
    }

    pub(crate) fn disconnected(&self) {
        (self.on_disconnect)();
    }

    pub(crate) fn message(&self, envelope: Envelope) {
        (self.on_message)(envelope);
    }
}
