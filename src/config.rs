//! # Configuration
//!
//! `ConsoleConfig` is read from an optional TOML file; every field has a
//! default, so an empty file (or none at all) is a working setup against a
//! local backend. Two environment variables override the file:
//!
//! | Variable             | Overrides       |
//! |----------------------|-----------------|
//! | `DISPATCH_API_URL`   | `api.base_url`  |
//! | `DISPATCH_API_TOKEN` | `api.token`     |
//!
//! ```toml
//! [api]
//! base_url = "https://console.example.com/api"
//! timeout_secs = 10
//!
//! [geocoding]
//! default_city = "Ribeirão Preto"
//!
//! [resolver]
//! debounce_ms = 300
//!
//! [polling]
//! dashboard_interval_secs = 5
//! tracking_interval_secs = 10
//!
//! [origin]
//! name = "Cozinha Central"
//! lat = -21.17
//! lng = -47.80
//! ```

use crate::address::{PlaceSearchSettings, MAX_PLACE_SUGGESTIONS};
use crate::geometry::Coordinate;
use crate::polling::PollingConfig;
use crate::tracking::Origin;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const ENV_API_URL: &str = "DISPATCH_API_URL";
pub const ENV_API_TOKEN: &str = "DISPATCH_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Pre-issued bearer token, sent as-is.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub postal_url: String,
    pub place_search_url: String,
    pub bias_lat: f64,
    pub bias_lon: f64,
    pub default_city: String,
    pub country: String,
    pub result_limit: usize,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        let places = PlaceSearchSettings::default();
        Self {
            postal_url: "https://viacep.com.br/ws".to_string(),
            place_search_url: "https://photon.komoot.io/api/".to_string(),
            bias_lat: places.bias.lat,
            bias_lon: places.bias.lng,
            default_city: places.default_city,
            country: places.country,
            result_limit: places.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub debounce_ms: u64,
    pub address_min_length: usize,
    pub customer_min_length: usize,
    pub menu_min_length: usize,
    pub tracking_min_length: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            address_min_length: 3,
            customer_min_length: 2,
            menu_min_length: 2,
            tracking_min_length: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub dashboard_interval_secs: u64,
    pub tracking_interval_secs: u64,
    /// Orders requested per dashboard poll.
    pub orders_limit: usize,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            dashboard_interval_secs: 5,
            tracking_interval_secs: 10,
            orders_limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            name: "Restaurante".to_string(),
            lat: -21.17,
            lng: -47.80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub geocoding: GeocodingConfig,
    pub resolver: ResolverSettings,
    pub polling: PollingSettings,
    pub origin: OriginConfig,
}

impl ConsoleConfig {
    /// Reads `path` if given, applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), "Config file loaded");
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies overrides from `lookup`, normally the process environment.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.is_empty()) {
            self.api.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("api.timeout_secs", self.api.timeout_secs),
            ("polling.dashboard_interval_secs", self.polling.dashboard_interval_secs),
            ("polling.tracking_interval_secs", self.polling.tracking_interval_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
            }
        }
        if !(1..=MAX_PLACE_SUGGESTIONS).contains(&self.geocoding.result_limit) {
            return Err(ConfigError::Invalid(format!(
                "geocoding.result_limit must be between 1 and {MAX_PLACE_SUGGESTIONS}"
            )));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.resolver.debounce_ms)
    }

    pub fn polling_config(&self) -> PollingConfig {
        PollingConfig {
            dashboard_interval: Duration::from_secs(self.polling.dashboard_interval_secs),
            tracking_interval: Duration::from_secs(self.polling.tracking_interval_secs),
        }
    }

    pub fn place_settings(&self) -> PlaceSearchSettings {
        PlaceSearchSettings {
            bias: Coordinate::new(self.geocoding.bias_lat, self.geocoding.bias_lon),
            default_city: self.geocoding.default_city.clone(),
            country: self.geocoding.country.clone(),
            limit: self.geocoding.result_limit,
        }
    }

    pub fn origin(&self) -> Origin {
        Origin::new(
            self.origin.name.clone(),
            Coordinate::new(self.origin.lat, self.origin.lng),
        )
    }
}
