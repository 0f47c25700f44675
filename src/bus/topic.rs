//! Topic identifiers.
//!
//! A [`Topic`] is an opaque string key. It often looks hierarchical
//! (`/shared/sensorValues`) but the bus never parses its structure.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The server publishes the latest array of sensor readings on this topic.
pub const SENSOR_VALUES: &str = "/shared/sensorValues";

/// Reserved, local-only topic carrying the bridge connection-state boolean.
///
/// Every [`crate::bridge::BusBridge`] publishes `false` here on construction
/// and `true`/`false` as its connection goes up and down. It is never
/// transmitted across a bridge.
pub const BRIDGE_CONNECTED: &str = "/local/bridgeConnected";

/// Identifier of a publication/command channel on a [`super::Bus`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Creates a topic from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the topic as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty topic, which the bus ignores.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if this is the reserved [`BRIDGE_CONNECTED`] topic.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0 == BRIDGE_CONNECTED
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&Topic> for Topic {
    fn from(topic: &Topic) -> Self {
        topic.clone()
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_string() {
        let topic = Topic::from(SENSOR_VALUES);
        let json = serde_json::to_string(&topic).ok();
        assert_eq!(json.as_deref(), Some("\"/shared/sensorValues\""));
    }

    #[test]
    fn reserved_topic_is_recognised() {
        assert!(Topic::from(BRIDGE_CONNECTED).is_reserved());
        assert!(!Topic::from(SENSOR_VALUES).is_reserved());
    }

    #[test]
    fn empty_topic() {
        assert!(Topic::new("").is_empty());
        assert!(!Topic::new("/x").is_empty());
    }
}
