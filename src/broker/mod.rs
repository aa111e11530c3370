//! The `broker` module is the in-memory core: topics, who follows them,
//! the last record for each, and fan-out to connections.

pub mod cache;
pub mod coordinator;
pub mod engine;
pub mod registry;
pub mod subscriptions;
pub mod topic;

pub use coordinator::Coordinator;
pub use engine::Broker;
