//! Operations that suspend on the weather source.
//!
//! Each one takes the broker lock for a short admission step, releases it
//! for the network call, and takes it again to commit. The commit step
//! re-checks whatever may have changed while the lock was free: capacity and
//! duplicates for an add, topic existence for a fetch result.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::broker::cache::{Observation, Snapshot};
use crate::broker::topic::{ConnectionId, Topic};
use crate::source::WeatherSource;
use crate::transport::message::ServerMessage;
use crate::utils::error::{SourceError, TopicError};

#[derive(Clone)]
pub struct Coordinator {
    broker: Arc<Mutex<Broker>>,
    source: Arc<dyn WeatherSource>,
}

impl Coordinator {
    pub fn new(broker: Broker, source: Arc<dyn WeatherSource>) -> Self {
        Self {
            broker: Arc::new(Mutex::new(broker)),
            source,
        }
    }

    /// Locks the broker. A panic elsewhere while holding the lock leaves the
    /// indexes consistent (every mutation is a single call), so poisoning is
    /// ignored.
    pub fn broker(&self) -> MutexGuard<'_, Broker> {
        self.broker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolves and registers a new topic.
    pub async fn add_topic(&self, raw: &str) -> Result<Topic, TopicError> {
        let name = self.broker().admit_topic(raw)?;

        let geo = self.source.geocode(&name).await.map_err(|err| {
            warn!("geocoding '{name}' failed: {err}");
            TopicError::ResolutionFailed(name.clone())
        })?;
        if geo.name != name {
            debug!("'{name}' resolved to '{}', {}", geo.name, geo.country);
        }

        self.broker()
            .commit_topic(Topic::new(geo.name, geo.coordinates))
    }

    pub fn remove_topic(&self, name: &str) -> Result<Topic, TopicError> {
        self.broker().remove_topic(name)
    }

    pub fn list_topics(&self) -> Vec<String> {
        self.broker().topic_names()
    }

    /// Registers each name in order; failures are logged and skipped.
    pub async fn seed_topics(&self, names: &[String]) {
        for name in names {
            match self.add_topic(name).await {
                Ok(topic) => info!("seeded topic {}", topic.name),
                Err(err) => warn!("could not seed topic '{name}': {err}"),
            }
        }
    }

    /// Moves `connection` to `name`, fetches fresh conditions for it and
    /// sends the snapshot to `connection`.
    ///
    /// A failed fetch still leaves the subscription in place and yields
    /// [`Snapshot::Unavailable`]. If the fetch shows something new, the
    /// topic's other subscribers get it too. The reply is sent under the
    /// same lock as the commit, so a poll result can never overtake it.
    pub async fn subscribe(
        &self,
        connection: &ConnectionId,
        name: &str,
    ) -> Result<Snapshot, TopicError> {
        let topic = self.broker().join(connection, name)?;
        info!("{connection} subscribed to {}", topic.name);

        let fetched = self
            .source
            .current_conditions(&topic.name, topic.coordinates)
            .await;

        let mut broker = self.broker();
        if !broker.is_registered(&topic.name) {
            return Err(TopicError::UnknownTopic(topic.name));
        }

        let snapshot = match fetched {
            Ok(record) => {
                if let Some(observation) = broker.record(record.clone()) {
                    log_observation(&topic.name, &observation);
                    if observation.should_emit() {
                        broker.publish_except(
                            &topic.name,
                            connection,
                            &ServerMessage::weather(&record),
                        );
                    }
                }
                Snapshot::Live(record)
            }
            Err(err) => {
                warn!("immediate fetch for {} failed: {err}", topic.name);
                Snapshot::Unavailable {
                    city: topic.name.clone(),
                    at: Utc::now(),
                }
            }
        };

        // moved, unsubscribed, disconnected or evicted while the fetch ran
        if broker.subscriptions.topic_of(connection) != Some(topic.name.as_str()) {
            debug!("{connection} left {} before its snapshot arrived", topic.name);
            return Err(TopicError::SubscriptionLost(topic.name));
        }

        broker.send_to(connection, &ServerMessage::snapshot(&snapshot));
        Ok(snapshot)
    }

    pub fn unsubscribe(&self, connection: &ConnectionId) -> Option<String> {
        self.broker().leave(connection)
    }

    /// Disconnect hook: drops the client and all its subscriptions.
    pub fn unsubscribe_all(&self, connection: &ConnectionId) {
        self.broker().cleanup_client(connection);
    }

    /// Fetches `topic` and pushes the record to its subscribers if it passes
    /// the change gate.
    ///
    /// `Ok(None)` means the topic was deleted while the fetch was in flight
    /// and the result was dropped.
    pub async fn refresh(&self, topic: &Topic) -> Result<Option<Observation>, SourceError> {
        let record = self
            .source
            .current_conditions(&topic.name, topic.coordinates)
            .await?;

        let mut broker = self.broker();
        let Some(observation) = broker.record(record.clone()) else {
            return Ok(None);
        };
        log_observation(&topic.name, &observation);
        if observation.should_emit() {
            let addressed = broker.publish(&topic.name, &ServerMessage::weather(&record));
            debug!("{}: update sent to {addressed} subscriber(s)", topic.name);
        }
        Ok(Some(observation))
    }
}

fn log_observation(topic: &str, observation: &Observation) {
    if observation.first {
        info!("{topic}: first observation");
    } else if observation.changed.is_empty() {
        debug!("{topic}: unchanged");
    } else {
        info!("{topic}: changed {}", observation.changed.join(", "));
    }
}
