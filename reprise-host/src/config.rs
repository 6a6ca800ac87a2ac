use std::path::PathBuf;

use derive_more::From;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use reprise::Configuration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

#[derive(Debug, From, Error)]
pub enum ConfigError {
    #[error(
        "Failed to get configuration directory. Please specify the location using the `--config <path>` flag"
    )]
    NoDirectory,

    #[error("Failed to parse config: {0}")]
    Parse(Box<figment::Error>),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Milliseconds between speculative statistics while playing
    pub peek_interval_ms: u64,
    /// Granularity of simulated time while waiting, in milliseconds
    pub tick_ms: u64,
    pub seconds_precision: usize,
    pub include_entry_table: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            peek_interval_ms: 5000,
            tick_ms: 100,
            seconds_precision: 2,
            include_entry_table: true,
        }
    }
}

impl Settings {
    /// Defaults, then `settings.toml` from the config directory, then `REPRISE_*` variables
    pub fn get(override_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut settings = Figment::from(Serialized::defaults(Self::default()));

        let config_dir = override_path
            .or_else(|| {
                ProjectDirs::from("com", "Reprise", "Reprise")
                    .map(|dirs| dirs.config_dir().to_path_buf())
            })
            .ok_or(ConfigError::NoDirectory)?;

        let settings_toml = config_dir.join("settings.toml");
        if settings_toml.exists() {
            log::debug!("Loading settings from {}", settings_toml.display());
            settings = settings.merge(Toml::file(settings_toml));
        }

        settings = settings.merge(Env::prefixed("REPRISE_"));

        let settings: Self = settings.extract().map_err(Box::new)?;
        Ok(settings)
    }

    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl From<&Settings> for Configuration {
    fn from(settings: &Settings) -> Self {
        Self {
            peek_interval: Duration::from_millis(settings.peek_interval_ms),
            seconds_precision: settings.seconds_precision,
            include_entry_table: settings.include_entry_table,
        }
    }
}
