//! In-memory [`WeatherSource`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use super::WeatherSource;
use super::model::{Coordinates, GeoResult, WeatherRecord};
use crate::utils::error::SourceError;

pub(crate) fn sample_record(city: &str, temperature: i64) -> WeatherRecord {
    WeatherRecord {
        city: city.to_string(),
        temperature,
        feels_like: temperature - 2,
        precipitation: 0.4,
        wind_speed: 12,
        wind_direction: 270,
        humidity: 65,
        weather_code: 3,
        observed_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    }
}

/// Pauses `current_conditions` until the test releases it.
#[derive(Clone, Default)]
pub(crate) struct FetchGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub(crate) struct FakeSource {
    places: Mutex<HashMap<String, GeoResult>>,
    temperatures: Mutex<HashMap<String, i64>>,
    failing: Mutex<HashSet<String>>,
    fetches: Mutex<Vec<String>>,
    gate: Mutex<Option<FetchGate>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(self, name: &str, latitude: f64, longitude: f64) -> Self {
        self.places.lock().unwrap().insert(
            name.to_lowercase(),
            GeoResult {
                name: name.to_string(),
                coordinates: Coordinates {
                    latitude,
                    longitude,
                },
                country: "Testland".to_string(),
                region: None,
            },
        );
        self
    }

    /// Make `query` geocode to the already known `canonical` city.
    pub fn with_alias(self, query: &str, canonical: &str) -> Self {
        let hit = self
            .places
            .lock()
            .unwrap()
            .get(&canonical.to_lowercase())
            .cloned()
            .expect("alias target must be registered first");
        self.places.lock().unwrap().insert(query.to_lowercase(), hit);
        self
    }

    pub fn set_temperature(&self, city: &str, temperature: i64) {
        self.temperatures
            .lock()
            .unwrap()
            .insert(city.to_string(), temperature);
    }

    pub fn fail_fetches(&self, city: &str) {
        self.failing.lock().unwrap().insert(city.to_string());
    }

    pub fn heal(&self, city: &str) {
        self.failing.lock().unwrap().remove(city);
    }

    pub fn hold_fetches(&self) -> FetchGate {
        let gate = FetchGate::default();
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn release_fetches(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.release.notify_one();
        }
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherSource for FakeSource {
    async fn geocode(&self, name: &str) -> Result<GeoResult, SourceError> {
        self.places
            .lock()
            .unwrap()
            .get(&name.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    async fn current_conditions(
        &self,
        city: &str,
        _coordinates: Coordinates,
    ) -> Result<WeatherRecord, SourceError> {
        self.fetches.lock().unwrap().push(city.to_string());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.failing.lock().unwrap().contains(city) {
            return Err(SourceError::Transport(format!("{city} unreachable")));
        }
        let temperature = self
            .temperatures
            .lock()
            .unwrap()
            .get(city)
            .copied()
            .unwrap_or(20);
        Ok(sample_record(city, temperature))
    }
}
