//! Connection ↔ topic membership.
//!
//! Two indexes are kept in step: each connection's single current topic,
//! and each topic's subscriber set. A topic with no subscribers has no
//! entry, so `active_topics` is just the key set.

use std::collections::{HashMap, HashSet};

use crate::broker::topic::ConnectionId;

#[derive(Debug, Default)]
pub struct SubscriptionManager {
    by_connection: HashMap<ConnectionId, String>,
    by_topic: HashMap<String, HashSet<ConnectionId>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `connection` to `topic`, leaving its previous topic.
    ///
    /// Returns the topic it left, if it was a different one.
    pub fn subscribe(&mut self, connection: &ConnectionId, topic: &str) -> Option<String> {
        let previous = match self.by_connection.get(connection) {
            Some(current) if current == topic => return None,
            Some(_) => self.unsubscribe(connection),
            None => None,
        };

        self.by_connection
            .insert(connection.clone(), topic.to_string());
        self.by_topic
            .entry(topic.to_string())
            .or_default()
            .insert(connection.clone());
        previous
    }

    /// Leaves the current topic, returning it.
    pub fn unsubscribe(&mut self, connection: &ConnectionId) -> Option<String> {
        let topic = self.by_connection.remove(connection)?;
        self.detach(&topic, connection);
        Some(topic)
    }

    /// Drops every trace of `connection`. Idempotent.
    pub fn unsubscribe_all(&mut self, connection: &ConnectionId) {
        self.by_connection.remove(connection);
        self.by_topic.retain(|_, subscribers| {
            subscribers.remove(connection);
            !subscribers.is_empty()
        });
    }

    /// Removes `topic` entirely and returns the connections that were on it.
    pub fn evict_topic(&mut self, topic: &str) -> HashSet<ConnectionId> {
        let evicted = self.by_topic.remove(topic).unwrap_or_default();
        for connection in &evicted {
            self.by_connection.remove(connection);
        }
        evicted
    }

    pub fn subscribers(&self, topic: &str) -> impl Iterator<Item = &ConnectionId> {
        self.by_topic.get(topic).into_iter().flatten()
    }

    pub fn topic_of(&self, connection: &ConnectionId) -> Option<&str> {
        self.by_connection.get(connection).map(String::as_str)
    }

    pub fn is_active(&self, topic: &str) -> bool {
        self.by_topic.contains_key(topic)
    }

    /// Topics with at least one subscriber.
    pub fn active_topics(&self) -> HashSet<String> {
        self.by_topic.keys().cloned().collect()
    }

    fn detach(&mut self, topic: &str, connection: &ConnectionId) {
        if let Some(subscribers) = self.by_topic.get_mut(topic) {
            subscribers.remove(connection);
            if subscribers.is_empty() {
                self.by_topic.remove(topic);
            }
        }
    }
}
