//! Records produced by a [`WeatherSource`](super::WeatherSource).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of a lookup-by-name.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoResult {
    /// Canonical name as the provider spells it.
    pub name: String,
    pub coordinates: Coordinates,
    pub country: String,
    pub region: Option<String>,
}

/// Normalized current conditions for one city.
///
/// Built only by adapters, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub temperature: i64,
    pub feels_like: i64,
    /// Millimetres, one decimal place.
    pub precipitation: f64,
    pub wind_speed: i64,
    pub wind_direction: i64,
    pub humidity: i64,
    pub weather_code: i64,
    pub observed_at: DateTime<Utc>,
}

impl WeatherRecord {
    /// Names of the readings that differ from `previous`.
    ///
    /// `city` and `observed_at` are not readings and never count as a change.
    pub fn changed_fields(&self, previous: &WeatherRecord) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.temperature != previous.temperature {
            changed.push("temp");
        }
        if self.feels_like != previous.feels_like {
            changed.push("feelsLike");
        }
        if self.precipitation != previous.precipitation {
            changed.push("precipitation");
        }
        if self.wind_speed != previous.wind_speed {
            changed.push("windSpeed");
        }
        if self.wind_direction != previous.wind_direction {
            changed.push("windDirection");
        }
        if self.humidity != previous.humidity {
            changed.push("humidity");
        }
        if self.weather_code != previous.weather_code {
            changed.push("weatherCode");
        }
        changed
    }
}

/// Round to the nearest integer, halves away from zero.
pub fn round_whole(value: f64) -> i64 {
    value.round() as i64
}

/// Round to one decimal place.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
