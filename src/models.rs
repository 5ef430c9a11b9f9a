//! Data models for regions, cities and OpenWeather API responses
//!
//! This module contains the bounding-box value type, the city references
//! produced by a city-list lookup, and the typed OpenWeather response
//! payloads. Provider responses are decoded once, at the fetch boundary,
//! into these structures instead of being traversed as loose JSON.

use crate::WeatherBoxError;
use serde::{Deserialize, Serialize};

/// Rectangular lat/lon region used to query cities
///
/// Constructed from the user-facing ordering (top/bottom latitude,
/// left/right longitude) and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRegion {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl GeoRegion {
    /// Build a region from its limiting coordinates.
    ///
    /// `lat_top` is the maximum (northern) latitude, `lat_bottom` the
    /// minimum, `lon_left` the minimum (western) longitude, `lon_right`
    /// the maximum. Returns a validation error when a bound is outside
    /// the valid coordinate range or the ordering is inverted.
    pub fn new(
        lat_top: f64,
        lat_bottom: f64,
        lon_left: f64,
        lon_right: f64,
    ) -> Result<Self, WeatherBoxError> {
        for lat in [lat_top, lat_bottom] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(WeatherBoxError::validation(format!(
                    "Latitude must be between -90 and 90, got: {lat}"
                )));
            }
        }
        for lon in [lon_left, lon_right] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(WeatherBoxError::validation(format!(
                    "Longitude must be between -180 and 180, got: {lon}"
                )));
            }
        }
        if lat_bottom > lat_top {
            return Err(WeatherBoxError::validation(format!(
                "Bottom latitude ({lat_bottom}) cannot exceed top latitude ({lat_top})"
            )));
        }
        if lon_left > lon_right {
            return Err(WeatherBoxError::validation(format!(
                "Left longitude ({lon_left}) cannot exceed right longitude ({lon_right})"
            )));
        }

        Ok(Self {
            lat_min: lat_bottom,
            lat_max: lat_top,
            lon_min: lon_left,
            lon_max: lon_right,
        })
    }

    /// Minimum (southern) latitude
    #[must_use]
    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    /// Maximum (northern) latitude
    #[must_use]
    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    /// Minimum (western) longitude
    #[must_use]
    pub fn lon_min(&self) -> f64 {
        self.lon_min
    }

    /// Maximum (eastern) longitude
    #[must_use]
    pub fn lon_max(&self) -> f64 {
        self.lon_max
    }
}

/// One city returned by a city-list lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CityRef {
    /// City name as reported by the provider
    pub name: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

/// Convert a temperature reported in Kelvin to Celsius
#[must_use]
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - 273.15
}

/// OpenWeather API response structures
pub mod openweather {
    use super::*;

    /// Response from the box/city (city list) endpoint
    #[derive(Debug, Deserialize)]
    pub struct CityListResponse {
        /// Cities inside the requested bounding box; may be absent or empty
        #[serde(default)]
        pub list: Vec<CityEntry>,
    }

    /// One city entry from the box/city endpoint
    #[derive(Debug, Deserialize)]
    pub struct CityEntry {
        pub name: String,
        #[serde(default)]
        pub coord: Option<Coord>,
    }

    /// Coordinate as reported by the box/city endpoint
    ///
    /// The provider capitalizes these field names on this endpoint.
    #[derive(Debug, Clone, Copy, Deserialize)]
    pub struct Coord {
        #[serde(rename = "Lat")]
        pub lat: f64,
        #[serde(rename = "Lon")]
        pub lon: f64,
    }

    impl CityEntry {
        /// Flatten the wire shape into a [`CityRef`], dropping entries
        /// the provider returned without coordinates.
        pub fn into_city_ref(self) -> Option<CityRef> {
            self.coord.map(|coord| CityRef {
                name: self.name,
                lat: coord.lat,
                lon: coord.lon,
            })
        }
    }

    /// Full weather payload from the one-call endpoint
    ///
    /// Temperatures are Kelvin, pressure hPa, visibility meters, wind
    /// speed m/s. Fields the provider may omit are optional; the payload
    /// round-trips through serde so it can be persisted as structured
    /// JSON.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WeatherSnapshot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub lat: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub lon: Option<f64>,
        /// Slash-delimited timezone name, e.g. "America/New_York"
        pub timezone: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub timezone_offset: Option<i64>,
        /// Current conditions; absent for some subscription tiers
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub current: Option<CurrentConditions>,
        /// Hour-by-hour short-term forecast, ordered by time
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub hourly: Vec<HourlyConditions>,
        /// Provider fields not modeled above (daily, minutely, alerts, ...);
        /// carried through so persisted files keep the full payload
        #[serde(flatten)]
        pub extra: serde_json::Map<String, serde_json::Value>,
    }

    impl WeatherSnapshot {
        /// Last segment of the timezone name, used to group persisted
        /// snapshots ("America/New_York" -> "New_York").
        #[must_use]
        pub fn timezone_leaf(&self) -> &str {
            self.timezone.rsplit('/').next().unwrap_or(&self.timezone)
        }
    }

    /// Current conditions block of the one-call response
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CurrentConditions {
        /// Observation time, unix seconds
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub dt: Option<i64>,
        /// Temperature in Kelvin
        pub temp: f64,
        /// Perceived temperature in Kelvin
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub feels_like: Option<f64>,
        /// Atmospheric pressure in hPa
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub pressure: Option<u32>,
        /// Relative humidity in percent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub humidity: Option<u8>,
        /// Visibility in meters
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub visibility: Option<u32>,
        /// Wind speed in m/s
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub wind_speed: Option<f64>,
        /// Wind direction in degrees
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub wind_deg: Option<u16>,
        /// Weather condition descriptions; the first entry is displayed
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub weather: Vec<ConditionDescription>,
        /// Unmodeled provider fields (dew_point, uvi, clouds, ...)
        #[serde(flatten)]
        pub extra: serde_json::Map<String, serde_json::Value>,
    }

    impl CurrentConditions {
        /// Temperature converted to Celsius
        #[must_use]
        pub fn temp_celsius(&self) -> f64 {
            kelvin_to_celsius(self.temp)
        }

        /// Perceived temperature converted to Celsius, when reported
        #[must_use]
        pub fn feels_like_celsius(&self) -> Option<f64> {
            self.feels_like.map(kelvin_to_celsius)
        }

        /// Visibility converted to kilometers, when reported
        #[must_use]
        pub fn visibility_km(&self) -> Option<f64> {
            self.visibility.map(|v| f64::from(v) / 1000.0)
        }
    }

    /// One hourly forecast record
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct HourlyConditions {
        /// Forecast time, unix seconds
        pub dt: i64,
        /// Temperature in Kelvin
        pub temp: f64,
        /// Weather condition descriptions
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub weather: Vec<ConditionDescription>,
        /// Unmodeled provider fields
        #[serde(flatten)]
        pub extra: serde_json::Map<String, serde_json::Value>,
    }

    impl HourlyConditions {
        /// Temperature converted to Celsius
        #[must_use]
        pub fn temp_celsius(&self) -> f64 {
            kelvin_to_celsius(self.temp)
        }
    }

    /// Human-readable weather condition from the provider
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ConditionDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub main: Option<String>,
        /// Lower-case description text, e.g. "broken clouds"
        pub description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub icon: Option<String>,
    }
}
