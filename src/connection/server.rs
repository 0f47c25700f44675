//! Multi-peer server connection.
//!
//! Fans one bus out to every attached peer. The connection keeps its own
//! last-publication cache so that a peer attaching late is brought up to
//! date without any new publish, independent of the bus it serves.
//!
//! # Liveness
//!
//! The connect callback fires when the peer count goes from 0 to 1, the
//! disconnect callback when it goes from 1 to 0. Each transition is
//! reported exactly once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::replay::ReplayCache;
use super::transport::{PeerChannel, PeerIncoming};
use super::{Connection, ConnectionCallbacks};
use crate::bus::Envelope;

/// Peer ids are unique for the lifetime of the process.
static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of an attached peer.
pub type PeerId = u64;

#[derive(Debug, Default)]
struct ServerState {
    peers: BTreeMap<PeerId, Peer>,
    cache: ReplayCache,
}

#[derive(Debug)]
struct Peer {
    outbound: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
}

#[derive(Debug)]
enum PeerEvent {
    Message(PeerId, String),
    Detached(PeerId),
}

/// Server-side connection broadcasting to every attached peer.
#[derive(Debug)]
pub struct ServerConnection {
    state: Arc<Mutex<ServerState>>,
    event_loop: JoinHandle<()>,
}

impl ServerConnection {
    /// Starts accepting peers from `incoming` and dispatching their events
    /// to `callbacks`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(callbacks: ConnectionCallbacks, incoming: PeerIncoming) -> Self {
        let state = Arc::new(Mutex::new(ServerState::default()));
        let event_loop = tokio::spawn(run_events(Arc::clone(&state), incoming, callbacks));
        Self { state, event_loop }
    }

    /// Returns the number of currently attached peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        lock(&self.state).peers.len()
    }
}

impl Connection for ServerConnection {
    fn send(&self, envelope: &Envelope) {
        let frame = match envelope.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(topic = %envelope.topic, error = %e, "failed to encode envelope");
                return;
            }
        };

        let mut state = lock(&self.state);
        for peer in state.peers.values() {
            // A closed channel means the peer is detaching; its reader task
            // reports that through the event loop.
            let _ = peer.outbound.send(frame.clone());
        }
        tracing::trace!(topic = %envelope.topic, peers = state.peers.len(), "broadcast");
        if envelope.is_publication() {
            state.cache.retain(&envelope.topic, frame);
        }
    }
}

impl Drop for ServerConnection {
    fn drop(&mut self) {
        self.event_loop.abort();
        for peer in lock(&self.state).peers.values() {
            peer.reader.abort();
        }
    }
}

fn lock(state: &Mutex<ServerState>) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_events(
    state: Arc<Mutex<ServerState>>,
    mut incoming: PeerIncoming,
    callbacks: ConnectionCallbacks,
) {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut accepting = true;

    loop {
        tokio::select! {
            channel = incoming.recv(), if accepting => match channel {
                Some(channel) => attach(&state, channel, &events_tx, &callbacks),
                None => {
                    tracing::debug!("peer acceptor closed");
                    accepting = false;
                    if lock(&state).peers.is_empty() {
                        break;
                    }
                }
            },
            Some(event) = events_rx.recv() => match event {
                PeerEvent::Message(peer_id, frame) => receive(&state, peer_id, &frame, &callbacks),
                PeerEvent::Detached(peer_id) => {
                    detach(&state, peer_id, &callbacks);
                    if !accepting && lock(&state).peers.is_empty() {
                        break;
                    }
                }
            },
            else => break,
        }
    }
}

fn attach(
    state: &Mutex<ServerState>,
    channel: PeerChannel,
    events: &mpsc::UnboundedSender<PeerEvent>,
    callbacks: &ConnectionCallbacks,
) {
    let peer_id = NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed);
    let PeerChannel {
        outbound,
        mut inbound,
    } = channel;

    let events = events.clone();
    let reader = tokio::spawn(async move {
        while let Some(frame) = inbound.recv().await {
            if events.send(PeerEvent::Message(peer_id, frame)).is_err() {
                return;
            }
        }
        let _ = events.send(PeerEvent::Detached(peer_id));
    });

    let (peers, replayed) = {
        let mut state = lock(state);
        let mut replayed = 0;
        for frame in state.cache.frames() {
            if outbound.send(frame.to_string()).is_ok() {
                replayed += 1;
            }
        }
        state.peers.insert(peer_id, Peer { outbound, reader });
        (state.peers.len(), replayed)
    };

    tracing::info!(peer_id, peers, replayed, "peer attached");
    if peers == 1 {
        callbacks.connected();
    }
}

fn receive(state: &Mutex<ServerState>, peer_id: PeerId, frame: &str, callbacks: &ConnectionCallbacks) {
    let envelope = match Envelope::decode(frame) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(peer_id, error = %e, "dropping undecodable message from peer");
            return;
        }
    };

    // Cache first: anything broadcast while the message is dispatched is
    // newer and must win.
    if envelope.is_publication() {
        lock(state).cache.retain(&envelope.topic, frame.to_string());
    }
    callbacks.message(envelope);
}

fn detach(state: &Mutex<ServerState>, peer_id: PeerId, callbacks: &ConnectionCallbacks) {
    let (removed, peers) = {
        let mut state = lock(state);
        let removed = state.peers.remove(&peer_id);
        (removed, state.peers.len())
    };

    let Some(peer) = removed else {
        return;
    };
    peer.reader.abort();
    tracing::info!(peer_id, peers, "peer detached");
    if peers == 0 {
        callbacks.disconnected();
    }
}
