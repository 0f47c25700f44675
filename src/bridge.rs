//! Bus bridge: keeps a chosen set of topics consistent across a connection.
//!
//! A [`BusBridge`] owns one [`Connection`] and shares one [`Bus`]:
//!
//! - Local publications and commands on a transmitted topic are sent out as
//!   envelopes. This includes the late-join replay the bridge's own
//!   subscription triggers when the bus already holds a value.
//! - Inbound envelopes are replayed on the local bus (`PUBLICATION` through
//!   [`Bus::publish`], `COMMAND` through [`Bus::send_command`]); other types
//!   are ignored.
//! - The connection's liveness is published as a boolean on the reserved
//!   [`BRIDGE_CONNECTED`] topic, starting with `false`.

use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::bus::topic::BRIDGE_CONNECTED;
use crate::bus::{Bus, Envelope, MessageType, Topic};
use crate::connection::{
    ClientChannel, ClientConnection, Connection, ConnectionCallbacks, PeerIncoming,
    ServerConnection,
};

/// Glue between one [`Bus`] and one [`Connection`].
#[derive(Debug)]
pub struct BusBridge<C> {
    bus: Arc<Bus>,
    connection: Arc<C>,
    topics: Vec<Topic>,
}

impl<C: Connection> BusBridge<C> {
    /// Builds the bridge.
    ///
    /// `connect` receives the callbacks the connection must drive and
    /// returns the ready connection (client or server variant).
    pub fn new<T, F>(bus: Arc<Bus>, topics_to_transmit: impl IntoIterator<Item = T>, connect: F) -> Self
    where
        T: Into<Topic>,
        F: FnOnce(ConnectionCallbacks) -> C,
    {
        bus.publish(BRIDGE_CONNECTED, Value::Bool(false));

        let connection = Arc::new(connect(callbacks_for(Arc::downgrade(&bus))));

        let mut topics = Vec::new();
        for topic in topics_to_transmit {
            let topic = topic.into();
            if topic.is_reserved() {
                tracing::warn!(%topic, "connection-state topic is local only, not transmitting it");
                continue;
            }
            transmit(&bus, &connection, &topic);
            topics.push(topic);
        }
        tracing::debug!(topics = ?topics, "bus bridge ready");

        Self {
            bus,
            connection,
            topics,
        }
    }

    /// The bus this bridge serves.
    #[must_use]
    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    /// The owned connection.
    #[must_use]
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Topics mirrored onto the connection.
    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

impl BusBridge<ServerConnection> {
    /// Bridges `bus` to every peer arriving through `incoming`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn server<T: Into<Topic>>(
        bus: Arc<Bus>,
        topics_to_transmit: impl IntoIterator<Item = T>,
        incoming: PeerIncoming,
    ) -> Self {
        Self::new(bus, topics_to_transmit, |callbacks| {
            ServerConnection::new(callbacks, incoming)
        })
    }
}

impl BusBridge<ClientConnection> {
    /// Bridges `bus` to the single server behind `channel`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn client<T: Into<Topic>>(
        bus: Arc<Bus>,
        topics_to_transmit: impl IntoIterator<Item = T>,
        channel: ClientChannel,
    ) -> Self {
        Self::new(bus, topics_to_transmit, |callbacks| {
            ClientConnection::new(callbacks, channel)
        })
    }
}

fn transmit<C: Connection>(bus: &Bus, connection: &Arc<C>, topic: &Topic) {
    let outbound = Arc::clone(connection);
    let publication_topic = topic.clone();
    bus.subscribe_to_publication(topic, move |data| {
        outbound.send(&Envelope::publication(&publication_topic, data.clone()));
    });

    let outbound = Arc::clone(connection);
    let command_topic = topic.clone();
    bus.subscribe_to_command(topic, move |data| {
        outbound.send(&Envelope::command(&command_topic, data.clone()));
    });
}

// The bus already owns the connection through the transmit subscriptions,
// so the connection's callbacks hold the bus weakly.
fn callbacks_for(bus: Weak<Bus>) -> ConnectionCallbacks {
    let on_connect = Weak::clone(&bus);
    let on_disconnect = Weak::clone(&bus);
    ConnectionCallbacks::new(
        move || {
            if let Some(bus) = on_connect.upgrade() {
                bus.publish(BRIDGE_CONNECTED, Value::Bool(true));
            }
        },
        move || {
            if let Some(bus) = on_disconnect.upgrade() {
                bus.publish(BRIDGE_CONNECTED, Value::Bool(false));
            }
        },
        move |envelope: Envelope| {
            let Some(bus) = bus.upgrade() else {
                return;
            };
            match envelope.kind {
                MessageType::Publication => bus.publish(envelope.topic, envelope.data),
                MessageType::Command => bus.send_command(envelope.topic, envelope.data),
                MessageType::Unrecognized(kind) => {
                    tracing::debug!(%kind, topic = %envelope.topic, "ignoring envelope of unknown type");
                }
            }
        },
    )
}
