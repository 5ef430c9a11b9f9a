//! `weatherbox` - Fetch and archive OpenWeather data for a bounding box
//!
//! This library provides the headless core: city lookup for a geographic
//! region, rate-limited weather-detail fetching, sequential or concurrent
//! batch runs over every city in the region, and persistence of the
//! results as per-city JSON files grouped by timezone. The terminal front
//! end in `main.rs` is presentation glue over these modules.

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod store;

// Re-export core types for public API
pub use api::{FetchWeather, OpenWeatherClient, RateLimiter};
pub use batch::{BatchCoordinator, BatchMode, BatchOutcome, BatchResult, CityWeather};
pub use config::WeatherBoxConfig;
pub use error::WeatherBoxError;
pub use models::{CityRef, GeoRegion};
pub use store::{PersistReport, persist_batch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherBoxError>;
