use crate::dates::REFERENCE_TIMEZONE;
use crate::route::HistoryMode;
use crate::search::{AlgoliaClient, DEFAULT_HITS_PER_PAGE, DEFAULT_INDEX};
use chrono_tz::Tz;
use serde::Deserialize;

pub const APP_DIR: &str = "meetups-cal";
const ENV_PREFIX: &str = "MEETUPS_CAL";

#[derive(Debug, Deserialize)]
pub struct AlgoliaSettings {
    pub app_id: String,
    pub api_key: String,
    pub index_name: String,
    pub hits_per_page: u32,
    /// Overrides the `https://{app_id}-dsn.algolia.net` host.
    pub host: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub algolia: AlgoliaSettings,
    pub reference_timezone: Option<String>,
    pub history: Option<HistoryMode>,
    pub refresh_interval_minutes: Option<u64>,
    pub enable_debug_log: Option<bool>,
}

impl Settings {
    pub fn timezone(&self) -> Result<Tz, crate::error::Error> {
        match &self.reference_timezone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| crate::error::Error::UnknownTimezone(name.clone())),
            None => Ok(REFERENCE_TIMEZONE),
        }
    }

    pub fn search_client(&self) -> AlgoliaClient {
        let client = AlgoliaClient::new(&self.algolia.app_id, &self.algolia.api_key)
            .with_index(&self.algolia.index_name)
            .with_hits_per_page(self.algolia.hits_per_page);
        match &self.algolia.host {
            Some(host) => client.with_base_url(host),
            None => client,
        }
    }
}

fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("algolia.index_name", DEFAULT_INDEX)?
        .set_default("algolia.hits_per_page", DEFAULT_HITS_PER_PAGE as i64)
}

/// Reads `~/.config/meetups-cal/Settings.toml` (optional) and `MEETUPS_CAL__*`
/// environment variables, the latter winning.
pub fn load_config() -> Result<Settings, config::ConfigError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        config::ConfigError::Message("Could not find the config directory.".into())
    })?;
    let config_path = config_dir.join(APP_DIR).join("Settings.toml");

    let settings = builder()?
        .add_source(config::File::from(config_path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
fn load_from_str(toml: &str) -> Result<Settings, config::ConfigError> {
    builder()?
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize()
}
