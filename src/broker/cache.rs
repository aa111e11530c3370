//! Latest record per topic and the change gate in front of fan-out.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::source::WeatherRecord;

/// What a subscriber is handed straight after subscribing.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Live(WeatherRecord),
    /// The immediate fetch failed; the subscription still stands.
    Unavailable { city: String, at: DateTime<Utc> },
}

/// Result of storing a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// No earlier record existed for the topic.
    pub first: bool,
    pub changed: Vec<&'static str>,
}

impl Observation {
    /// Change-gated emission: first sight or any differing reading.
    pub fn should_emit(&self) -> bool {
        self.first || !self.changed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: HashMap<String, WeatherRecord>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` unconditionally and reports how it compares to the
    /// record it replaced.
    pub fn observe(&mut self, record: WeatherRecord) -> Observation {
        let observation = match self.entries.get(&record.city) {
            Some(previous) => Observation {
                first: false,
                changed: record.changed_fields(previous),
            },
            None => Observation {
                first: true,
                changed: Vec::new(),
            },
        };
        self.entries.insert(record.city.clone(), record);
        observation
    }

    pub fn get(&self, topic: &str) -> Option<&WeatherRecord> {
        self.entries.get(topic)
    }

    pub fn remove(&mut self, topic: &str) -> Option<WeatherRecord> {
        self.entries.remove(topic)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
