use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants;
use crate::error::{PolicyWeatherError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub noaa: NoaaConfig,
    pub search: SearchConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub search_temperature: f32,
    pub extract_temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    /// Read from `OPENAI_API_KEY`, never from the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::OPENAI_BASE_URL.to_string(),
            model: "gpt-4o".to_string(),
            search_temperature: 0.7,
            extract_temperature: 0.1,
            max_tokens: 1000,
            timeout_seconds: 30,
            api_key: None,
        }
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoaaConfig {
    pub storm_events_url: String,
    pub cdo_url: String,
    pub timeout_seconds: u64,
    /// Read from `NOAA_API_KEY`, never from the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for NoaaConfig {
    fn default() -> Self {
        Self {
            storm_events_url: constants::NOAA_STORM_EVENTS_URL.to_string(),
            cdo_url: constants::NOAA_CDO_DATA_URL.to_string(),
            timeout_seconds: 30,
            api_key: None,
        }
    }
}

impl NoaaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on each event source call, applied by the search use case.
    pub source_timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            source_timeout_seconds: 45,
        }
    }
}

impl SearchConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON-lines file reconciled events are appended to; unset disables persistence.
    pub path: Option<String>,
    /// Upper bound on persisting one search's events.
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            timeout_seconds: 10,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Load configuration from `path` (or `config.toml`), falling back to
    /// defaults when the file does not exist, then read secrets from the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path.is_some();
        let config_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(config_path).map_err(|e| {
                PolicyWeatherError::Config(format!(
                    "Failed to read config file '{}': {}",
                    config_path.display(),
                    e
                ))
            })?;
            Self::from_toml(&config_content)?
        } else if explicit {
            return Err(PolicyWeatherError::Config(format!(
                "Config file '{}' does not exist",
                config_path.display()
            )));
        } else {
            Config::default()
        };

        config.openai.api_key = non_empty_env(constants::OPENAI_API_KEY_ENV);
        config.noaa.api_key = non_empty_env(constants::NOAA_API_KEY_ENV);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
