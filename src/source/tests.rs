use chrono::{TimeZone, Utc};
use serde_json::json;

use super::fake::sample_record;
use super::model::{round_tenth, round_whole};
use super::open_meteo::{ForecastResponse, GeocodingResponse, normalize_current, normalize_geocoding};
use crate::utils::error::SourceError;

fn forecast(body: serde_json::Value) -> ForecastResponse {
    serde_json::from_value(body).unwrap()
}

#[test]
fn test_rounding_helpers() {
    assert_eq!(round_whole(20.5), 21);
    assert_eq!(round_whole(-0.4), 0);
    assert_eq!(round_whole(13.49), 13);
    assert_eq!(round_tenth(0.25), 0.3);
    assert_eq!(round_tenth(1.04), 1.0);
}

#[test]
fn test_geocoding_takes_first_hit() {
    let response: GeocodingResponse = serde_json::from_value(json!({
        "results": [
            {"name": "London", "latitude": 51.5074, "longitude": -0.1278,
             "country": "United Kingdom", "admin1": "England"},
            {"name": "London", "latitude": 42.98, "longitude": -81.23, "country": "Canada"}
        ]
    }))
    .unwrap();

    let geo = normalize_geocoding("london", response).unwrap();
    assert_eq!(geo.name, "London");
    assert_eq!(geo.coordinates.latitude, 51.5074);
    assert_eq!(geo.coordinates.longitude, -0.1278);
    assert_eq!(geo.country, "United Kingdom");
    assert_eq!(geo.region.as_deref(), Some("England"));
}

#[test]
fn test_geocoding_without_results_is_not_found() {
    let response: GeocodingResponse =
        serde_json::from_value(json!({"generationtime_ms": 0.5})).unwrap();
    assert!(matches!(
        normalize_geocoding("Atlantis", response),
        Err(SourceError::NotFound(name)) if name == "Atlantis"
    ));

    let response: GeocodingResponse = serde_json::from_value(json!({"results": []})).unwrap();
    assert!(matches!(
        normalize_geocoding("Atlantis", response),
        Err(SourceError::NotFound(_))
    ));
}

#[test]
fn test_current_conditions_are_normalized() {
    let response = forecast(json!({
        "current": {
            "time": "2025-03-01T14:15",
            "temperature_2m": 20.6,
            "apparent_temperature": 18.2,
            "precipitation": 0.26,
            "wind_speed_10m": 14.5,
            "wind_direction_10m": 225,
            "relative_humidity_2m": 71,
            "weather_code": 61
        }
    }));

    let record = normalize_current("London", response, Utc::now()).unwrap();
    assert_eq!(record.city, "London");
    assert_eq!(record.temperature, 21);
    assert_eq!(record.feels_like, 18);
    assert_eq!(record.precipitation, 0.3);
    assert_eq!(record.wind_speed, 15);
    assert_eq!(record.wind_direction, 225);
    assert_eq!(record.humidity, 71);
    assert_eq!(record.weather_code, 61);
    assert_eq!(
        record.observed_at,
        Utc.with_ymd_and_hms(2025, 3, 1, 14, 15, 0).unwrap()
    );
}

#[test]
fn test_missing_temperature_is_incomplete() {
    let response = forecast(json!({
        "current": {"time": "2025-03-01T14:15", "apparent_temperature": 18.2}
    }));
    assert!(matches!(
        normalize_current("London", response, Utc::now()),
        Err(SourceError::IncompleteData(_))
    ));

    let response = forecast(json!({"latitude": 51.5}));
    assert!(matches!(
        normalize_current("London", response, Utc::now()),
        Err(SourceError::IncompleteData(_))
    ));
}

#[test]
fn test_unparseable_time_falls_back_to_fetch_time() {
    let fetched_at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    let response = forecast(json!({
        "current": {"time": "yesterday", "temperature_2m": 9.0}
    }));
    let record = normalize_current("Oslo", response, fetched_at).unwrap();
    assert_eq!(record.observed_at, fetched_at);
    assert_eq!(record.humidity, 0);
}

#[test]
fn test_changed_fields_ignores_timestamp() {
    let before = sample_record("London", 20);
    let mut after = before.clone();
    after.observed_at = Utc::now();
    assert!(after.changed_fields(&before).is_empty());

    after.temperature = 21;
    after.humidity = 80;
    assert_eq!(after.changed_fields(&before), vec!["temp", "humidity"]);
}
