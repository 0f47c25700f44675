//! Wire envelope for publications and commands.
//!
//! Every frame crossing a bridge is one JSON object:
//!
//! ```json
//! { "type": "PUBLICATION", "topic": "/shared/sensorValues", "data": [ ... ] }
//! ```
//!
//! `data` is opaque to the bus. A `type` other than `PUBLICATION` or
//! `COMMAND` still decodes (as [`MessageType::Unrecognized`]) so that the
//! receiving side can ignore it instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Topic;
use crate::error::BusError;

const PUBLICATION: &str = "PUBLICATION";
const COMMAND: &str = "COMMAND";

/// Discriminator of an [`Envelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    /// Cached, replayable value on a topic.
    Publication,
    /// One-shot signal on a topic.
    Command,
    /// Any other type tag received from a peer, kept verbatim.
    Unrecognized(String),
}

impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            PUBLICATION => Self::Publication,
            COMMAND => Self::Command,
            _ => Self::Unrecognized(tag),
        }
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Publication => PUBLICATION.to_string(),
            MessageType::Command => COMMAND.to_string(),
            MessageType::Unrecognized(tag) => tag,
        }
    }
}

/// A publication or command as transmitted between bridged buses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Topic the message belongs to.
    pub topic: Topic,
    /// Opaque payload. Missing on the wire decodes as `null`.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Builds a `PUBLICATION` envelope.
    #[must_use]
    pub fn publication(topic: impl Into<Topic>, data: Value) -> Self {
        Self {
            kind: MessageType::Publication,
            topic: topic.into(),
            data,
        }
    }

    /// Builds a `COMMAND` envelope.
    #[must_use]
    pub fn command(topic: impl Into<Topic>, data: Value) -> Self {
        Self {
            kind: MessageType::Command,
            topic: topic.into(),
            data,
        }
    }

    /// Returns `true` for publication envelopes.
    #[must_use]
    pub fn is_publication(&self) -> bool {
        self.kind == MessageType::Publication
    }

    /// Encodes the envelope as a single JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Encode`] if the payload cannot be serialized.
    pub fn encode(&self) -> Result<String, BusError> {
        serde_json::to_string(self).map_err(BusError::Encode)
    }

    /// Decodes a JSON text frame into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::MalformedEnvelope`] if the frame is not a JSON
    /// object with a string `type` and a string `topic`.
    pub fn decode(frame: &str) -> Result<Self, BusError> {
        serde_json::from_str(frame).map_err(BusError::MalformedEnvelope)
    }
}
