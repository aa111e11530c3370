//! A topic is a city a connection can follow.
//!
//! Identity is the display name compared case-insensitively; the stored
//! `name` keeps the spelling the geocoder returned.

use crate::source::Coordinates;

pub type ConnectionId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub name: String,
    pub coordinates: Coordinates,
}

impl Topic {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }

    /// Case-insensitive match against another spelling of a name.
    pub fn matches(&self, name: &str) -> bool {
        normalize(&self.name) == normalize(name)
    }
}

/// Key used for case-insensitive comparison of topic names.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
