//! Reconnecting WebSocket client transport.
//!
//! [`connect`] spawns a task that keeps a `tokio-tungstenite` socket open to
//! the bridge server. Each successful handshake is reported as
//! [`ClientEvent::Connected`], each lost session as
//! [`ClientEvent::Disconnected`]; after a failure or a close the task waits
//! `reconnect_interval` and tries again. The task ends once the
//! [`ClientChannel`] is dropped.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::connection::{ClientChannel, ClientEvent, ClientSocket, client_channel};

/// Opens the client transport to `url` in the background.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn connect(url: impl Into<String>, reconnect_interval: Duration) -> (ClientChannel, JoinHandle<()>) {
    let (channel, socket) = client_channel();
    let task = tokio::spawn(run(url.into(), reconnect_interval, socket));
    (channel, task)
}

enum SessionEnd {
    Lost,
    Shutdown,
}

async fn run(url: String, reconnect_interval: Duration, mut socket: ClientSocket) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                tracing::info!(%url, "bridge socket open");
                if socket.events.send(ClientEvent::Connected).is_err() {
                    return;
                }
                let end = pump(stream, &mut socket).await;
                if socket.events.send(ClientEvent::Disconnected).is_err() {
                    return;
                }
                if matches!(end, SessionEnd::Shutdown) {
                    return;
                }
                tracing::info!(%url, "bridge socket lost");
            }
            Err(e) => {
                tracing::debug!(%url, error = %e, "bridge connect failed");
            }
        }

        // Nothing is queued across sessions.
        while socket.outbound.try_recv().is_ok() {}
        if socket.events.is_closed() {
            return;
        }
        tokio::time::sleep(reconnect_interval).await;
    }
}

async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    socket: &mut ClientSocket,
) -> SessionEnd {
    let (mut ws_tx, mut ws_rx) = stream.split();
    let events: &mpsc::UnboundedSender<ClientEvent> = &socket.events;

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(ClientEvent::Message(text.as_str().to_owned())).is_err() {
                            return SessionEnd::Shutdown;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Lost,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "bridge socket read failed");
                        return SessionEnd::Lost;
                    }
                    _ => {}
                }
            }
            frame = socket.outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = ws_tx.send(Message::text(frame)).await {
                            tracing::debug!(error = %e, "bridge socket write failed");
                            return SessionEnd::Lost;
                        }
                    }
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        return SessionEnd::Shutdown;
                    }
                }
            }
        }
    }
}
