//! Last-publication cache of a server connection.
//!
//! Holds the most recent encoded `PUBLICATION` frame per topic, iterated in
//! the order topics were first cached. Overwriting a topic keeps its slot.

use std::collections::HashMap;

use crate::bus::Topic;

/// Insertion-ordered map from topic to its latest encoded publication.
#[derive(Debug, Default)]
pub struct ReplayCache {
    frames: Vec<(Topic, String)>,
    slots: HashMap<Topic, usize>,
}

impl ReplayCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame` as the latest publication on `topic`.
    pub fn retain(&mut self, topic: &Topic, frame: String) {
        if let Some(slot) = self.slots.get(topic).copied()
            && let Some(entry) = self.frames.get_mut(slot)
        {
            entry.1 = frame;
            return;
        }
        self.slots.insert(topic.clone(), self.frames.len());
        self.frames.push((topic.clone(), frame));
    }

    /// Iterates the cached frames in first-cached order.
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|(_, frame)| frame.as_str())
    }

    /// Returns the number of cached topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` when nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_order() {
        let mut cache = ReplayCache::new();
        cache.retain(&Topic::from("/b"), "b1".to_string());
        cache.retain(&Topic::from("/a"), "a1".to_string());
        cache.retain(&Topic::from("/b"), "b2".to_string());

        let frames: Vec<&str> = cache.frames().collect();
        assert_eq!(frames, vec!["b2", "a1"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn starts_empty() {
        let cache = ReplayCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.frames().count(), 0);
    }
}
