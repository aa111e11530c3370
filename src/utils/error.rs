//! Error types for `weathercast`.
//!
//! Two families exist. `TopicError` covers requests a client made that the
//! core refused; its `Display` text is what the client sees in a
//! `validation_error` event. `SourceError` covers the external weather
//! provider; callers log it and degrade instead of failing the request.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("City '{0}' already exists")]
    DuplicateTopic(String),

    #[error("Maximum of {0} cities reached")]
    CapacityExceeded(usize),

    #[error("City '{0}' not found")]
    NotFound(String),

    #[error("Unknown city '{0}'")]
    UnknownTopic(String),

    #[error("Could not find a location named '{0}'")]
    ResolutionFailed(String),

    #[error("Subscription to '{0}' ended before its data arrived")]
    SubscriptionLost(String),

    #[error("Connection is closed")]
    ConnectionClosed,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no location matches '{0}'")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("incomplete data: {0}")]
    IncompleteData(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}
