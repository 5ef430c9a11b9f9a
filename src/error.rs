//! Error types and handling for the `weatherbox` application

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the `weatherbox` application
#[derive(Error, Debug)]
pub enum WeatherBoxError {
    /// Configuration-related errors (missing or malformed credentials)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport-level API errors (network, timeout, non-2xx, bad body)
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors (malformed bounding boxes, bad selections)
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Failure writing a weather snapshot to disk
    #[error("Failed to persist '{}'", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherBoxError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherBoxError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            WeatherBoxError::Api { .. } => {
                "Unable to reach OpenWeather. Please check your internet connection and API key."
                    .to_string()
            }
            WeatherBoxError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            WeatherBoxError::Persistence { path, .. } => {
                format!(
                    "Could not write '{}'. Please check file permissions and disk space.",
                    path.display()
                )
            }
            WeatherBoxError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
