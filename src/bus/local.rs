//! In-process publish/subscribe bus with one-shot commands.
//!
//! [`Bus`] keeps two subscriber tables (publications and commands) and the
//! last value published on each topic. A publication subscriber registered
//! after a value was published receives that value immediately, before
//! `subscribe_to_publication` returns. Commands are never cached.
//!
//! Delivery is synchronous: `publish` and `send_command` return only after
//! every subscriber registered at call time has run, in subscription order.
//!
//! Every operation is serialized per bus: the cache update and the fan-out
//! of one publication complete before another thread's publication starts,
//! so all subscribers see a topic's values in the order the cache took them.
//! The lock is re-entrant, so a callback may publish, send commands or
//! subscribe on the same bus from the delivering thread.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde_json::Value;

use super::Topic;

/// Subscriber callback. Receives the published or commanded value.
pub type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
struct BusState {
    publication_subscribers: HashMap<Topic, Vec<Callback>>,
    command_subscribers: HashMap<Topic, Vec<Callback>>,
    last_published: HashMap<Topic, Value>,
}

/// Topic-keyed publish/subscribe bus.
///
/// Share it as `Arc<Bus>`; producers, consumers and bridges all hold the
/// same instance for the lifetime of the process.
#[derive(Default)]
pub struct Bus {
    // The `RefCell` is only borrowed for table access, never across a
    // callback, so re-entrant calls always find it free.
    state: ReentrantMutex<RefCell<BusState>>,
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();
        let state = guard.borrow();
        f.debug_struct("Bus")
            .field("publication_topics", &state.publication_subscribers.len())
            .field("command_topics", &state.command_subscribers.len())
            .field("cached_topics", &state.last_published.len())
            .finish()
    }
}

impl Bus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for publications on `topic`.
    ///
    /// If a value was already published on `topic`, `callback` is invoked
    /// with it before this method returns. An empty topic is ignored.
    pub fn subscribe_to_publication<F>(&self, topic: impl Into<Topic>, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let topic = topic.into();
        if topic.is_empty() {
            tracing::debug!("ignoring publication subscription on empty topic");
            return;
        }

        let callback: Callback = Arc::new(callback);
        let guard = self.state.lock();
        let replay = {
            let mut state = guard.borrow_mut();
            state
                .publication_subscribers
                .entry(topic.clone())
                .or_default()
                .push(Arc::clone(&callback));
            state.last_published.get(&topic).cloned()
        };

        if let Some(value) = replay {
            tracing::trace!(%topic, "replaying last publication to new subscriber");
            callback(&value);
        }
    }

    /// Registers `callback` for commands on `topic`. Nothing is replayed.
    pub fn subscribe_to_command<F>(&self, topic: impl Into<Topic>, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let topic = topic.into();
        if topic.is_empty() {
            tracing::debug!("ignoring command subscription on empty topic");
            return;
        }

        self.state
            .lock()
            .borrow_mut()
            .command_subscribers
            .entry(topic)
            .or_default()
            .push(Arc::new(callback));
    }

    /// Publishes `data` on `topic`.
    ///
    /// The value replaces the cached last publication for `topic` even when
    /// nobody is subscribed, then every publication subscriber is invoked.
    pub fn publish(&self, topic: impl Into<Topic>, data: Value) {
        let topic = topic.into();
        if topic.is_empty() {
            tracing::debug!("ignoring publication on empty topic");
            return;
        }

        let guard = self.state.lock();
        let subscribers = {
            let mut state = guard.borrow_mut();
            state.last_published.insert(topic.clone(), data.clone());
            snapshot(&state.publication_subscribers, &topic)
        };

        tracing::trace!(%topic, subscribers = subscribers.len(), "publish");
        for callback in subscribers {
            callback(&data);
        }
    }

    /// Sends a one-shot command on `topic`.
    ///
    /// Without subscribers the command is discarded.
    pub fn send_command(&self, topic: impl Into<Topic>, data: Value) {
        let topic = topic.into();
        if topic.is_empty() {
            tracing::debug!("ignoring command on empty topic");
            return;
        }

        let guard = self.state.lock();
        let subscribers = snapshot(&guard.borrow().command_subscribers, &topic);

        tracing::trace!(%topic, subscribers = subscribers.len(), "send command");
        for callback in subscribers {
            callback(&data);
        }
    }

    /// Returns the last value published on `topic`, if any.
    #[must_use]
    pub fn last_published(&self, topic: &str) -> Option<Value> {
        self.state.lock().borrow().last_published.get(topic).cloned()
    }
}

fn snapshot(table: &HashMap<Topic, Vec<Callback>>, topic: &Topic) -> Vec<Callback> {
    table
        .get(topic)
        .map(|callbacks| callbacks.iter().map(Arc::clone).collect())
        .unwrap_or_default()
}
