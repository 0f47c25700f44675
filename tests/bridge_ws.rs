//! End-to-end bridge tests over real WebSockets.
//!
//! A server-side bridge is served by the axum router on an ephemeral port;
//! client-side bridges attach through the reconnecting tungstenite connector.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use sensor_bus::api;
use sensor_bus::api::info::ServerInfo;
use sensor_bus::app_state::AppState;
use sensor_bus::bridge::BusBridge;
use sensor_bus::bus::topic::{BRIDGE_CONNECTED, SENSOR_VALUES};
use sensor_bus::bus::{Bus, Envelope};
use sensor_bus::connection::{ClientConnection, ServerConnection, peer_acceptor};
use sensor_bus::ws::client;

async fn start_server(bus: &Arc<Bus>, topics: &[&str]) -> (SocketAddr, BusBridge<ServerConnection>) {
    let (acceptor, incoming) = peer_acceptor();
    let bridge = BusBridge::<ServerConnection>::server(Arc::clone(bus), topics.iter().copied(), incoming);
    let state = AppState {
        peer_acceptor: acceptor,
        info: Arc::new(ServerInfo::now()),
    };
    let app = api::build_router(Path::new("webroot")).with_state(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("cannot bind");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, bridge)
}

fn start_client(
    addr: SocketAddr,
    bus: &Arc<Bus>,
    topics: &[&str],
) -> (BusBridge<ClientConnection>, JoinHandle<()>) {
    let (channel, transport) = client::connect(format!("ws://{addr}/ws"), Duration::from_millis(50));
    let bridge = BusBridge::<ClientConnection>::client(Arc::clone(bus), topics.iter().copied(), channel);
    (bridge, transport)
}

async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

fn is_connected(bus: &Bus) -> bool {
    bus.last_published(BRIDGE_CONNECTED) == Some(Value::Bool(true))
}

#[tokio::test]
async fn late_client_catches_up_with_server_publication() {
    let server_bus = Arc::new(Bus::new());
    let (addr, _server) = start_server(&server_bus, &[SENSOR_VALUES]).await;
    assert_eq!(server_bus.last_published(BRIDGE_CONNECTED), Some(json!(false)));

    let readings = json!([{
        "timestamp": 1_700_000_000_000_i64,
        "unit": "°C",
        "value": 18.25,
        "geolocation": {"latitude": 47.95, "longitude": 16.82}
    }]);
    server_bus.publish(SENSOR_VALUES, readings.clone());

    let client_bus = Arc::new(Bus::new());
    let (_client, _transport) = start_client(addr, &client_bus, &[]);

    eventually("catch-up", || client_bus.last_published(SENSOR_VALUES).as_ref() == Some(&readings)).await;
    eventually("client connected", || is_connected(&client_bus)).await;
    eventually("server connected", || is_connected(&server_bus)).await;
}

#[tokio::test]
async fn server_publications_reach_every_client() {
    let server_bus = Arc::new(Bus::new());
    let (addr, server) = start_server(&server_bus, &[SENSOR_VALUES]).await;

    let bus_a = Arc::new(Bus::new());
    let bus_b = Arc::new(Bus::new());
    let (_client_a, _transport_a) = start_client(addr, &bus_a, &[]);
    let (_client_b, _transport_b) = start_client(addr, &bus_b, &[]);
    eventually("client a connected", || is_connected(&bus_a)).await;
    eventually("client b connected", || is_connected(&bus_b)).await;
    eventually("both peers attached", || server.connection().peer_count() == 2).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus_b.subscribe_to_publication(SENSOR_VALUES, move |value| {
        if let Ok(mut seen) = sink.lock() {
            seen.push(value.clone());
        }
    });

    server_bus.publish(SENSOR_VALUES, json!([1]));
    server_bus.publish(SENSOR_VALUES, json!([2]));

    eventually("client a update", || bus_a.last_published(SENSOR_VALUES) == Some(json!([2]))).await;
    eventually("client b update", || {
        seen.lock().map(|s| s.last() == Some(&json!([2]))).unwrap_or(false)
    })
    .await;
    let seen = seen.lock().map(|s| s.clone()).unwrap_or_default();
    assert_eq!(seen, vec![json!([1]), json!([2])]);
}

#[tokio::test]
async fn client_commands_and_publications_reach_server() {
    let server_bus = Arc::new(Bus::new());
    let (addr, _server) = start_server(&server_bus, &[]).await;

    let commands = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&commands);
    server_bus.subscribe_to_command("/ui/refresh", move |value| {
        if let Ok(mut commands) = sink.lock() {
            commands.push(value.clone());
        }
    });

    let client_bus = Arc::new(Bus::new());
    let (_client, _transport) = start_client(addr, &client_bus, &["/ui/refresh", "/ui/zoom"]);
    eventually("client connected", || is_connected(&client_bus)).await;

    client_bus.send_command("/ui/refresh", json!("now"));
    client_bus.publish("/ui/zoom", json!(17));

    eventually("zoom publication", || server_bus.last_published("/ui/zoom") == Some(json!(17))).await;
    eventually("refresh command", || {
        commands.lock().map(|c| c.as_slice() == [json!("now")]).unwrap_or(false)
    })
    .await;
}

#[tokio::test]
async fn server_reports_disconnect_when_last_client_leaves() {
    let server_bus = Arc::new(Bus::new());
    let (addr, server) = start_server(&server_bus, &[SENSOR_VALUES]).await;

    let client_bus = Arc::new(Bus::new());
    let (_client, transport) = start_client(addr, &client_bus, &[]);
    eventually("server connected", || is_connected(&server_bus)).await;
    assert_eq!(server.connection().peer_count(), 1);
    eventually("client connected", || is_connected(&client_bus)).await;

    transport.abort();
    eventually("server disconnected", || {
        server_bus.last_published(BRIDGE_CONNECTED) == Some(json!(false))
    })
    .await;
    assert_eq!(server.connection().peer_count(), 0);
}

#[tokio::test]
async fn malformed_frames_do_not_detach_the_peer() {
    let server_bus = Arc::new(Bus::new());
    let (addr, server) = start_server(&server_bus, &[]).await;

    let Ok((mut socket, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await else {
        panic!("cannot connect");
    };
    eventually("peer attached", || server.connection().peer_count() == 1).await;

    let valid = Envelope::publication("/raw", json!({"ok": true}));
    let Ok(frame) = valid.encode() else {
        panic!("encode failed");
    };
    for text in ["{not json".to_string(), frame] {
        if socket.send(Message::text(text)).await.is_err() {
            panic!("send failed");
        }
    }

    eventually("valid frame after garbage", || {
        server_bus.last_published("/raw") == Some(json!({"ok": true}))
    })
    .await;
    assert_eq!(server.connection().peer_count(), 1);
    let _ = socket.close(None).await;
    let _ = socket.next().await;
}
