//! # Weathercast
//!
//! `weathercast` keeps a small set of cities, polls current conditions for
//! them from Open-Meteo, and fans changes out to WebSocket clients that
//! subscribed to a city.
//!
//! ## Core Modules
//!
//! - `broker`: topic registry, subscriptions, snapshot cache and the
//!   coordinator that ties them to the weather source.
//! - `client`: a connected WebSocket client and its outbound channel.
//! - `config`: layered settings (defaults, optional file, environment).
//! - `poller`: the periodic refresh loop.
//! - `source`: the weather source trait and the Open-Meteo adapter.
//! - `transport`: the WebSocket gateway and wire messages.
//! - `utils`: errors and logging.

pub mod broker;
pub mod client;
pub mod config;
pub mod poller;
pub mod source;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod testing;
