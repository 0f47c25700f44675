//! Single-peer client connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::transport::{ClientChannel, ClientEvent};
use super::{Connection, ConnectionCallbacks};
use crate::bus::Envelope;

/// Connection to exactly one remote server.
///
/// While the transport is down, [`Connection::send`] drops messages: there
/// is no queue and no retry.
#[derive(Debug)]
pub struct ClientConnection {
    connected: Arc<AtomicBool>,
    outbound: mpsc::UnboundedSender<String>,
    event_loop: JoinHandle<()>,
}

impl ClientConnection {
    /// Starts dispatching `channel` events to `callbacks`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(callbacks: ConnectionCallbacks, channel: ClientChannel) -> Self {
        let ClientChannel { outbound, events } = channel;
        let connected = Arc::new(AtomicBool::new(false));
        let event_loop = tokio::spawn(run_events(events, Arc::clone(&connected), callbacks));
        Self {
            connected,
            outbound,
            event_loop,
        }
    }

    /// Returns `true` while the transport reports an open socket.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Connection for ClientConnection {
    fn send(&self, envelope: &Envelope) {
        if !self.is_connected() {
            tracing::trace!(topic = %envelope.topic, "not connected, dropping message");
            return;
        }
        match envelope.encode() {
            Ok(frame) => {
                if self.outbound.send(frame).is_err() {
                    tracing::debug!(topic = %envelope.topic, "client transport gone, dropping message");
                }
            }
            Err(e) => tracing::warn!(topic = %envelope.topic, error = %e, "failed to encode envelope"),
        }
    }
}

impl Drop for ClientConnection {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

async fn run_events(
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
    connected: Arc<AtomicBool>,
    callbacks: ConnectionCallbacks,
) {
    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::Connected => {
                if !connected.swap(true, Ordering::SeqCst) {
                    tracing::info!("connected to server");
                    callbacks.connected();
                }
            }
            ClientEvent::Disconnected => {
                if connected.swap(false, Ordering::SeqCst) {
                    tracing::info!("disconnected from server");
                    callbacks.disconnected();
                }
            }
            ClientEvent::Message(frame) => match Envelope::decode(&frame) {
                Ok(envelope) => callbacks.message(envelope),
                Err(e) => tracing::warn!(error = %e, "dropping undecodable message from server"),
            },
        }
    }

    if connected.swap(false, Ordering::SeqCst) {
        callbacks.disconnected();
    }
    tracing::debug!("client transport closed");
}
