//! The `transport` module is the connection gateway: the JSON protocol
//! spoken over WebSockets and the server that maps it onto the broker.

pub mod message;
pub mod websocket;

pub use websocket::start_websocket_server;

#[cfg(test)]
mod websocket_tests;
