//! Broker engine
//!
//! `Broker` is the single mutable context of the process. It owns the topic
//! registry, the subscription indexes, the snapshot cache and the handles of
//! every connected client, and it knows how to fan a `ServerMessage` out to
//! one connection, one topic's subscribers, or everyone.
//!
//! Everything here is synchronous. The broker lives behind an
//! `Arc<Mutex<Broker>>` and callers must not hold that lock across network
//! I/O; see `Coordinator` for the operations that need the weather source.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::cache::{Observation, SnapshotCache};
use crate::broker::registry::TopicRegistry;
use crate::broker::subscriptions::SubscriptionManager;
use crate::broker::topic::{ConnectionId, Topic};
use crate::client::Client;
use crate::config::{PollScope, TopicSettings};
use crate::source::WeatherRecord;
use crate::transport::message::ServerMessage;
use crate::utils::error::TopicError;

#[derive(Debug)]
pub struct Broker {
    pub(crate) registry: TopicRegistry,
    pub(crate) subscriptions: SubscriptionManager,
    pub(crate) cache: SnapshotCache,
    pub(crate) clients: HashMap<ConnectionId, Client>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(&TopicSettings {
            max_topics: 3,
            seed: Vec::new(),
        })
    }
}

impl Broker {
    pub fn new(settings: &TopicSettings) -> Self {
        Self {
            registry: TopicRegistry::new(settings.max_topics),
            subscriptions: SubscriptionManager::new(),
            cache: SnapshotCache::new(),
            clients: HashMap::new(),
        }
    }

    pub fn register_client(&mut self, client: Client) {
        debug!("registered client {}", client.id);
        self.clients.insert(client.id.clone(), client);
    }

    /// Forgets a disconnected client and every subscription it held.
    /// Safe to call more than once.
    pub fn cleanup_client(&mut self, client_id: &ConnectionId) {
        let was_registered = self.clients.remove(client_id).is_some();
        self.subscriptions.unsubscribe_all(client_id);
        if was_registered {
            info!("cleaned up client {client_id}");
        }
    }

    pub fn topic_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn topics_list(&self) -> ServerMessage {
        ServerMessage::TopicsList {
            topics: self.registry.names(),
        }
    }

    /// Pre-resolution checks for an add; returns the trimmed name.
    pub fn admit_topic(&self, raw: &str) -> Result<String, TopicError> {
        self.registry.admit(raw)
    }

    /// Inserts a resolved topic and announces it to every connection.
    pub fn commit_topic(&mut self, topic: Topic) -> Result<Topic, TopicError> {
        let topic = self.registry.insert(topic)?.clone();
        info!(
            "added topic {} ({:.4}, {:.4})",
            topic.name, topic.coordinates.latitude, topic.coordinates.longitude
        );
        self.broadcast(&self.topics_list());
        self.broadcast(&ServerMessage::TopicAdded {
            name: topic.name.clone(),
        });
        Ok(topic)
    }

    /// Deletes a topic, its snapshot and its subscriptions.
    ///
    /// Former subscribers get `topic_force_left` and are not moved anywhere
    /// else; everyone then gets `topic_deleted` and the new list.
    pub fn remove_topic(&mut self, name: &str) -> Result<Topic, TopicError> {
        let topic = self.registry.remove(name)?;
        self.cache.remove(&topic.name);

        let evicted = self.subscriptions.evict_topic(&topic.name);
        let notice = ServerMessage::TopicForceLeft {
            name: topic.name.clone(),
        };
        for connection in &evicted {
            self.send_to(connection, &notice);
        }
        info!(
            "removed topic {} ({} subscriber(s) forced out)",
            topic.name,
            evicted.len()
        );

        self.broadcast(&ServerMessage::TopicDeleted {
            name: topic.name.clone(),
        });
        self.broadcast(&self.topics_list());
        Ok(topic)
    }

    /// Moves `connection` onto the registered topic matching `name`.
    ///
    /// Fails for a connection that is no longer registered.
    pub fn join(&mut self, connection: &ConnectionId, name: &str) -> Result<Topic, TopicError> {
        if !self.clients.contains_key(connection) {
            return Err(TopicError::ConnectionClosed);
        }
        let topic = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| TopicError::UnknownTopic(name.trim().to_string()))?;

        if let Some(previous) = self.subscriptions.subscribe(connection, &topic.name) {
            debug!("{connection} left {previous}");
        }
        Ok(topic)
    }

    pub fn leave(&mut self, connection: &ConnectionId) -> Option<String> {
        self.subscriptions.unsubscribe(connection)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Stores a fetched record unless its topic has been deleted meanwhile.
    pub fn record(&mut self, record: WeatherRecord) -> Option<Observation> {
        if !self.registry.contains(&record.city) {
            debug!("discarding result for removed topic {}", record.city);
            return None;
        }
        Some(self.cache.observe(record))
    }

    /// Topics a polling round should visit, in registry order.
    pub fn poll_targets(&self, scope: PollScope) -> Vec<Topic> {
        self.registry
            .iter()
            .filter(|t| scope == PollScope::All || self.subscriptions.is_active(&t.name))
            .cloned()
            .collect()
    }

    pub fn send_to(&self, connection: &ConnectionId, msg: &ServerMessage) {
        if let Some(frame) = encode(msg) {
            self.deliver(connection, frame);
        }
    }

    pub fn broadcast(&self, msg: &ServerMessage) {
        let Some(frame) = encode(msg) else {
            return;
        };
        for client_id in self.clients.keys() {
            self.deliver(client_id, frame.clone());
        }
    }

    /// Sends to every subscriber of `topic`; returns how many were addressed.
    pub fn publish(&self, topic: &str, msg: &ServerMessage) -> usize {
        self.publish_filtered(topic, None, msg)
    }

    pub fn publish_except(&self, topic: &str, skip: &ConnectionId, msg: &ServerMessage) -> usize {
        self.publish_filtered(topic, Some(skip), msg)
    }

    fn publish_filtered(
        &self,
        topic: &str,
        skip: Option<&ConnectionId>,
        msg: &ServerMessage,
    ) -> usize {
        let Some(frame) = encode(msg) else {
            return 0;
        };
        let mut addressed = 0;
        for sub_id in self.subscriptions.subscribers(topic) {
            if Some(sub_id) == skip {
                continue;
            }
            self.deliver(sub_id, frame.clone());
            addressed += 1;
        }
        addressed
    }

    fn deliver(&self, client_id: &ConnectionId, frame: WsMessage) {
        match self.clients.get(client_id) {
            Some(client) => {
                if let Err(e) = client.sender.send(frame) {
                    warn!("failed to send to {client_id}: {e}");
                }
            }
            None => debug!("no client registered with id: {client_id}"),
        }
    }
}

fn encode(msg: &ServerMessage) -> Option<WsMessage> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(WsMessage::text(json)),
        Err(e) => {
            warn!("failed to serialize message: {e}");
            None
        }
    }
}
