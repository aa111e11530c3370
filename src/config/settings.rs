use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub topics: TopicSettings,
    pub poller: PollerSettings,
    pub source: SourceSettings,
}

/// Where the WebSocket gateway listens and how loudly it logs.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

/// Limits of the topic registry.
#[derive(Debug, Deserialize, Clone)]
pub struct TopicSettings {
    pub max_topics: usize,
    /// City names registered at startup.
    pub seed: Vec<String>,
}

/// Which topics a polling round visits.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PollScope {
    /// Only topics with at least one subscriber.
    #[default]
    Active,
    /// Every registered topic.
    All,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerSettings {
    pub interval_secs: u64,
    pub pacing_ms: u64,
    pub scope: PollScope,
}

impl PollerSettings {
    /// Tick period. Never zero, tokio refuses zero-length intervals.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Endpoints of the external weather provider.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub timeout_secs: u64,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled in from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub topics: Option<PartialTopicSettings>,
    pub poller: Option<PartialPollerSettings>,
    pub source: Option<PartialSourceSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialTopicSettings {
    pub max_topics: Option<usize>,
    pub seed: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PartialPollerSettings {
    pub interval_secs: Option<u64>,
    pub pacing_ms: Option<u64>,
    pub scope: Option<PollScope>,
}

#[derive(Debug, Deserialize)]
pub struct PartialSourceSettings {
    pub geocoding_url: Option<String>,
    pub forecast_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                log_level: "info".to_string(),
            },
            topics: TopicSettings {
                max_topics: 3,
                seed: Vec::new(),
            },
            poller: PollerSettings {
                interval_secs: 30,
                pacing_ms: 500,
                scope: PollScope::Active,
            },
            source: SourceSettings {
                geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
                forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
                timeout_secs: 10,
            },
        }
    }
}

impl PartialSettings {
    /// Overlay whatever was provided on top of the defaults.
    pub fn merge_with(self, default: Settings) -> Settings {
        let server = self.server;
        let topics = self.topics;
        let poller = self.poller;
        let source = self.source;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
                log_level: server
                    .as_ref()
                    .and_then(|s| s.log_level.clone())
                    .unwrap_or(default.server.log_level),
            },
            topics: TopicSettings {
                max_topics: topics
                    .as_ref()
                    .and_then(|t| t.max_topics)
                    .unwrap_or(default.topics.max_topics),
                seed: topics
                    .and_then(|t| t.seed)
                    .unwrap_or(default.topics.seed),
            },
            poller: PollerSettings {
                interval_secs: poller
                    .as_ref()
                    .and_then(|p| p.interval_secs)
                    .unwrap_or(default.poller.interval_secs),
                pacing_ms: poller
                    .as_ref()
                    .and_then(|p| p.pacing_ms)
                    .unwrap_or(default.poller.pacing_ms),
                scope: poller
                    .as_ref()
                    .and_then(|p| p.scope)
                    .unwrap_or(default.poller.scope),
            },
            source: SourceSettings {
                geocoding_url: source
                    .as_ref()
                    .and_then(|s| s.geocoding_url.clone())
                    .unwrap_or(default.source.geocoding_url),
                forecast_url: source
                    .as_ref()
                    .and_then(|s| s.forecast_url.clone())
                    .unwrap_or(default.source.forecast_url),
                timeout_secs: source
                    .as_ref()
                    .and_then(|s| s.timeout_secs)
                    .unwrap_or(default.source.timeout_secs),
            },
        }
    }
}
