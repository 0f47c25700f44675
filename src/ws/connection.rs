//! Server-side WebSocket pump for one attached peer.
//!
//! Moves text frames between the socket and the peer's
//! [`PeerSocket`](crate::connection::PeerSocket) until either side closes.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::connection::{PeerAcceptor, peer_channel};

/// Runs the read/write loop for a single WebSocket peer.
///
/// - Text frames from the peer go to the server connection unchanged.
/// - Frames queued by the server connection are written to the peer.
///
/// Returning drops the peer's inbound sender, which detaches the peer.
pub async fn run_peer_socket(socket: WebSocket, acceptor: PeerAcceptor) {
    let (channel, mut peer) = peer_channel();
    if acceptor.send(channel).is_err() {
        tracing::warn!("bridge is not accepting peers, closing socket");
        return;
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming frame from the peer
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if peer.from_peer.send(text.as_str().to_owned()).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!("ignoring binary frame from ws peer");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "ws peer read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Frame queued by the server connection
            frame = peer.to_peer.recv() => {
                match frame {
                    Some(frame) => {
                        if ws_tx.send(Message::text(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("ws peer closed");
}
