//! The `source` module is the boundary to the external weather provider.
//!
//! The core only talks to the [`WeatherSource`] trait; [`OpenMeteoClient`]
//! is the production implementation.

pub mod model;
pub mod open_meteo;

#[cfg(test)]
pub(crate) mod fake;
#[cfg(test)]
mod tests;

use async_trait::async_trait;

use crate::utils::error::SourceError;
pub use model::{Coordinates, GeoResult, WeatherRecord};
pub use open_meteo::OpenMeteoClient;

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Resolve a free-form city name to its canonical name and coordinates.
    async fn geocode(&self, name: &str) -> Result<GeoResult, SourceError>;

    /// Fetch and normalize the current conditions at `coordinates`,
    /// labelling the record with `city`.
    async fn current_conditions(
        &self,
        city: &str,
        coordinates: Coordinates,
    ) -> Result<WeatherRecord, SourceError>;
}
