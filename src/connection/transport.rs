//! Transport channel contract.
//!
//! Connections never touch a socket directly. A transport adapter (see
//! [`crate::ws`]) owns the socket and talks to the connection through
//! unbounded channels carrying encoded envelopes, one text frame per
//! message. Unbounded senders never block, which is the whole flow-control
//! story: there is none.
//!
//! - Client side: [`client_channel`] yields a [`ClientChannel`] for the
//!   connection and a [`ClientSocket`] for the adapter. The adapter reports
//!   [`ClientEvent::Connected`] / [`ClientEvent::Disconnected`] per session.
//! - Server side: every attached peer is a [`peer_channel`] pair. The
//!   adapter hands the [`PeerChannel`] to the server connection through a
//!   [`PeerAcceptor`] and keeps the [`PeerSocket`]. Dropping the socket's
//!   `from_peer` sender detaches the peer.

use tokio::sync::mpsc;

/// Event reported by a client transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The socket to the remote server is open.
    Connected,
    /// The socket was closed or lost.
    Disconnected,
    /// One raw text frame received from the server.
    Message(String),
}

/// Connection-side half of a client transport.
#[derive(Debug)]
pub struct ClientChannel {
    /// Encoded frames to write to the server.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Lifecycle events and inbound frames.
    pub events: mpsc::UnboundedReceiver<ClientEvent>,
}

/// Adapter-side half of a client transport.
#[derive(Debug)]
pub struct ClientSocket {
    /// Encoded frames the connection wants written.
    pub outbound: mpsc::UnboundedReceiver<String>,
    /// Where the adapter reports lifecycle events and inbound frames.
    pub events: mpsc::UnboundedSender<ClientEvent>,
}

/// Creates a linked client channel/socket pair.
#[must_use]
pub fn client_channel() -> (ClientChannel, ClientSocket) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    (
        ClientChannel {
            outbound: outbound_tx,
            events: events_rx,
        },
        ClientSocket {
            outbound: outbound_rx,
            events: events_tx,
        },
    )
}

/// Connection-side half of one attached server peer.
#[derive(Debug)]
pub struct PeerChannel {
    /// Encoded frames to write to this peer.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Raw frames received from this peer. Closes when the peer detaches.
    pub inbound: mpsc::UnboundedReceiver<String>,
}

/// Adapter-side half of one attached server peer.
#[derive(Debug)]
pub struct PeerSocket {
    /// Encoded frames to write to the peer. Closes when the connection
    /// drops the peer.
    pub to_peer: mpsc::UnboundedReceiver<String>,
    /// Raw frames read from the peer.
    pub from_peer: mpsc::UnboundedSender<String>,
}

/// Creates a linked peer channel/socket pair.
#[must_use]
pub fn peer_channel() -> (PeerChannel, PeerSocket) {
    let (to_peer_tx, to_peer_rx) = mpsc::unbounded_channel();
    let (from_peer_tx, from_peer_rx) = mpsc::unbounded_channel();
    (
        PeerChannel {
            outbound: to_peer_tx,
            inbound: from_peer_rx,
        },
        PeerSocket {
            to_peer: to_peer_rx,
            from_peer: from_peer_tx,
        },
    )
}

/// "New peer attached" event source of a server transport.
pub type PeerAcceptor = mpsc::UnboundedSender<PeerChannel>;

/// Receiving end of a [`PeerAcceptor`], consumed by
/// [`super::ServerConnection`].
pub type PeerIncoming = mpsc::UnboundedReceiver<PeerChannel>;

/// Creates a linked acceptor pair.
#[must_use]
pub fn peer_acceptor() -> (PeerAcceptor, PeerIncoming) {
    mpsc::unbounded_channel()
}
