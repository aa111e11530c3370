use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::broker::cache::Snapshot;
use crate::source::WeatherRecord;

/// Requests a connection may send, tagged by `"type"`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe { topic: String },

    #[serde(rename = "unsubscribe")]
    Unsubscribe,

    #[serde(rename = "add_topic")]
    AddTopic { name: String },

    #[serde(rename = "delete_topic")]
    DeleteTopic { topic: String },

    #[serde(rename = "list_topics")]
    ListTopics,
}

/// Events pushed to connections, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "weather_update")]
    WeatherUpdate(WeatherPayload),

    #[serde(rename = "topics_list")]
    TopicsList { topics: Vec<String> },

    #[serde(rename = "topic_added")]
    TopicAdded { name: String },

    #[serde(rename = "topic_deleted")]
    TopicDeleted { name: String },

    #[serde(rename = "topic_force_left")]
    TopicForceLeft { name: String },

    #[serde(rename = "validation_error")]
    ValidationError { message: String },
}

/// Marker sent in place of a temperature when none could be fetched.
pub const UNAVAILABLE: &str = "N/A";

/// A temperature reading or the explicit unavailable marker.
///
/// Serialized as a bare integer or as [`UNAVAILABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temperature {
    Celsius(i64),
    Unavailable,
}

impl Serialize for Temperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Temperature::Celsius(value) => serializer.serialize_i64(*value),
            Temperature::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Temperature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Temperature::Celsius(value)),
            Raw::Text(text) if text == UNAVAILABLE => Ok(Temperature::Unavailable),
            Raw::Text(text) => Err(D::Error::custom(format!(
                "expected a temperature or \"{UNAVAILABLE}\", got \"{text}\""
            ))),
        }
    }
}

/// Body of a `weather_update` event. Every reading except `temp` is `null`
/// in the degraded form.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPayload {
    pub city: String,
    pub temp: Temperature,
    pub feels_like: Option<i64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<i64>,
    pub wind_direction: Option<i64>,
    pub humidity: Option<i64>,
    pub weather_code: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl From<&WeatherRecord> for WeatherPayload {
    fn from(record: &WeatherRecord) -> Self {
        Self {
            city: record.city.clone(),
            temp: Temperature::Celsius(record.temperature),
            feels_like: Some(record.feels_like),
            precipitation: Some(record.precipitation),
            wind_speed: Some(record.wind_speed),
            wind_direction: Some(record.wind_direction),
            humidity: Some(record.humidity),
            weather_code: Some(record.weather_code),
            timestamp: record.observed_at,
        }
    }
}

impl From<&Snapshot> for WeatherPayload {
    fn from(snapshot: &Snapshot) -> Self {
        match snapshot {
            Snapshot::Live(record) => record.into(),
            Snapshot::Unavailable { city, at } => Self {
                city: city.clone(),
                temp: Temperature::Unavailable,
                feels_like: None,
                precipitation: None,
                wind_speed: None,
                wind_direction: None,
                humidity: None,
                weather_code: None,
                timestamp: *at,
            },
        }
    }
}

impl ServerMessage {
    pub fn weather(record: &WeatherRecord) -> Self {
        ServerMessage::WeatherUpdate(record.into())
    }

    pub fn snapshot(snapshot: &Snapshot) -> Self {
        ServerMessage::WeatherUpdate(snapshot.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        ServerMessage::ValidationError {
            message: message.into(),
        }
    }
}
