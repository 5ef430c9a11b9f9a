//! Configuration management for the `weatherbox` application
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings. The OpenWeather
//! API key is mandatory: a missing key fails here, before any request is
//! issued, rather than as a confusing HTTP 401 later on.

use crate::WeatherBoxError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `weatherbox` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherBoxConfig {
    /// OpenWeather API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Weather snapshot storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// OpenWeather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// OpenWeather API key (required)
    pub api_key: Option<String>,
    /// Base URL for the city-list (box/city) endpoint
    #[serde(default = "default_city_list_base_url")]
    pub city_list_base_url: String,
    /// Base URL for the weather-detail (one call) endpoint
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Storage configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory weather snapshots are dumped into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

// Default value functions
fn default_city_list_base_url() -> String {
    "https://api.openweathermap.org/data/2.5/box/city".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/3.0/onecall".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_output_dir() -> String {
    "weather_data".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            city_list_base_url: default_city_list_base_url(),
            weather_base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl WeatherBoxConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with WEATHERBOX_ prefix,
        // e.g. WEATHERBOX_API__API_KEY overrides api.api_key
        builder = builder.add_source(
            Environment::with_prefix("WEATHERBOX")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherBoxConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherbox").join("config.toml"))
    }

    /// Apply default values to fields an override may have blanked out
    pub fn apply_defaults(&mut self) {
        if self.api.city_list_base_url.is_empty() {
            self.api.city_list_base_url = default_city_list_base_url();
        }
        if self.api.weather_base_url.is_empty() {
            self.api.weather_base_url = default_weather_base_url();
        }
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_timeout();
        }
        if self.storage.output_dir.is_empty() {
            self.storage.output_dir = default_output_dir();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_urls()?;
        self.validate_numeric_ranges()?;
        Ok(())
    }

    /// Validate the API key. OpenWeather requires one for every endpoint
    /// this application talks to.
    pub fn validate_api_key(&self) -> Result<()> {
        match &self.api.api_key {
            None => Err(WeatherBoxError::config(
                "OpenWeather API key is missing. Set WEATHERBOX_API__API_KEY or add api.api_key to your config file.",
            )
            .into()),
            Some(api_key) if api_key.is_empty() => Err(WeatherBoxError::config(
                "OpenWeather API key cannot be empty. Please provide a valid key.",
            )
            .into()),
            Some(api_key) if api_key.len() < 8 => Err(WeatherBoxError::config(
                "OpenWeather API key appears to be invalid (too short). Please check your API key.",
            )
            .into()),
            Some(_) => Ok(()),
        }
    }

    /// Validate endpoint URLs
    fn validate_urls(&self) -> Result<()> {
        for url in [&self.api.city_list_base_url, &self.api.weather_base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherBoxError::config(format!(
                    "API base URL must be a valid HTTP or HTTPS URL, got '{url}'"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(
                WeatherBoxError::config("API timeout cannot exceed 300 seconds").into(),
            );
        }
        Ok(())
    }
}
