//! Bus layer: topics, the local publish/subscribe core and the wire envelope.
//!
//! Nothing in here knows about transports. The [`crate::bridge`] module
//! connects a [`Bus`] to a [`crate::connection::Connection`].

pub mod envelope;
pub mod local;
pub mod topic;

pub use envelope::{Envelope, MessageType};
pub use local::{Bus, Callback};
pub use topic::Topic;
