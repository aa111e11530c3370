//! Open-Meteo adapter.
//!
//! Geocoding and current conditions are two plain GET endpoints with no
//! authentication. Responses are deserialized into loose wire structs and
//! then normalized into [`GeoResult`] / [`WeatherRecord`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::WeatherSource;
use super::model::{Coordinates, GeoResult, WeatherRecord, round_tenth, round_whole};
use crate::config::SourceSettings;
use crate::utils::error::SourceError;

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,precipitation,\
wind_speed_10m,wind_direction_10m,relative_humidity_2m,weather_code";

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodingResponse {
    #[serde(default)]
    pub results: Option<Vec<GeocodingHit>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodingHit {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub admin1: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    pub current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentBlock {
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub relative_humidity_2m: Option<i64>,
    pub weather_code: Option<i64>,
}

/// HTTP client for the Open-Meteo geocoding and forecast APIs.
///
/// One `reqwest::Client` is reused for every call so connections are pooled.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("weathercast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            geocoding_url: settings.geocoding_url.clone(),
            forecast_url: settings.forecast_url.clone(),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn geocode(&self, name: &str) -> Result<GeoResult, SourceError> {
        debug!("geocoding '{name}'");
        let response: GeocodingResponse = self
            .http
            .get(&self.geocoding_url)
            .query(&[
                ("name", name),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        normalize_geocoding(name, response)
    }

    async fn current_conditions(
        &self,
        city: &str,
        coordinates: Coordinates,
    ) -> Result<WeatherRecord, SourceError> {
        debug!(
            "fetching current conditions for {city} ({:.4}, {:.4})",
            coordinates.latitude, coordinates.longitude
        );
        let latitude = coordinates.latitude.to_string();
        let longitude = coordinates.longitude.to_string();
        let response: ForecastResponse = self
            .http
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", CURRENT_FIELDS),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        normalize_current(city, response, Utc::now())
    }
}

pub(crate) fn normalize_geocoding(
    query: &str,
    response: GeocodingResponse,
) -> Result<GeoResult, SourceError> {
    let hit = response
        .results
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::NotFound(query.to_string()))?;

    Ok(GeoResult {
        name: hit.name,
        coordinates: Coordinates {
            latitude: hit.latitude,
            longitude: hit.longitude,
        },
        country: hit.country.unwrap_or_default(),
        region: hit.admin1,
    })
}

/// `fetched_at` stands in for the observation time when the provider's
/// `time` is missing or unparseable.
pub(crate) fn normalize_current(
    city: &str,
    response: ForecastResponse,
    fetched_at: DateTime<Utc>,
) -> Result<WeatherRecord, SourceError> {
    let current = response
        .current
        .ok_or_else(|| SourceError::IncompleteData(format!("no current block for {city}")))?;
    let temperature = current.temperature_2m.ok_or_else(|| {
        SourceError::IncompleteData(format!("current.temperature_2m missing for {city}"))
    })?;

    let observed_at = current
        .time
        .as_deref()
        .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok())
        .map(|naive| naive.and_utc())
        .unwrap_or(fetched_at);

    Ok(WeatherRecord {
        city: city.to_string(),
        temperature: round_whole(temperature),
        feels_like: round_whole(current.apparent_temperature.unwrap_or_default()),
        precipitation: round_tenth(current.precipitation.unwrap_or_default()),
        wind_speed: round_whole(current.wind_speed_10m.unwrap_or_default()),
        wind_direction: round_whole(current.wind_direction_10m.unwrap_or_default()),
        humidity: current.relative_humidity_2m.unwrap_or_default(),
        weather_code: current.weather_code.unwrap_or_default(),
        observed_at,
    })
}
