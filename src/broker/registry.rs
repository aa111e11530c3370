//! Bounded, insertion-ordered set of topics.

use crate::broker::topic::Topic;
use crate::utils::error::TopicError;

#[derive(Debug)]
pub struct TopicRegistry {
    topics: Vec<Topic>,
    max_topics: usize,
}

impl TopicRegistry {
    pub fn new(max_topics: usize) -> Self {
        Self {
            topics: Vec::new(),
            max_topics,
        }
    }

    /// Checks a raw name against the registry before it is resolved.
    ///
    /// Returns the trimmed name. Order of checks: empty, capacity, duplicate.
    pub fn admit(&self, raw: &str) -> Result<String, TopicError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(TopicError::InvalidInput(
                "City name cannot be empty".to_string(),
            ));
        }
        self.ensure_room()?;
        if let Some(existing) = self.get(name) {
            return Err(TopicError::DuplicateTopic(existing.name.clone()));
        }
        Ok(name.to_string())
    }

    /// Inserts a resolved topic, re-checking capacity and its canonical name.
    pub fn insert(&mut self, topic: Topic) -> Result<&Topic, TopicError> {
        self.ensure_room()?;
        if let Some(existing) = self.get(&topic.name) {
            return Err(TopicError::DuplicateTopic(existing.name.clone()));
        }
        self.topics.push(topic);
        Ok(&self.topics[self.topics.len() - 1])
    }

    pub fn remove(&mut self, name: &str) -> Result<Topic, TopicError> {
        let index = self
            .topics
            .iter()
            .position(|t| t.matches(name))
            .ok_or_else(|| TopicError::NotFound(name.trim().to_string()))?;
        Ok(self.topics.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.matches(name))
    }

    /// Exact lookup by canonical name.
    pub fn contains(&self, name: &str) -> bool {
        self.topics.iter().any(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    fn ensure_room(&self) -> Result<(), TopicError> {
        if self.topics.len() >= self.max_topics {
            return Err(TopicError::CapacityExceeded(self.max_topics));
        }
        Ok(())
    }
}
