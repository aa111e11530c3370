mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    PollScope, PollerSettings, ServerSettings, Settings, SourceSettings, TopicSettings,
};

/// Prefix for environment overrides, e.g. `WEATHERCAST_POLLER__INTERVAL_SECS`.
pub const ENV_PREFIX: &str = "WEATHERCAST";

/// Loads `config/default.*` (if present) and the environment on top of the
/// built-in defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Same as [`load_config`] but reads the optional file at `path`
/// (extension inferred by `config`).
///
/// Precedence: defaults < file < `WEATHERCAST_*` < `PORT`.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("topics.seed"),
        )
        .set_override_option("server.port", std::env::var("PORT").ok())?;

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_with(Settings::default()))
}
