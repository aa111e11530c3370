//! The `client` module defines the broker-side handle of a connection: its
//! identifier and the channel used to push frames to it.

pub mod connection;
pub use connection::Client;
