//! OpenWeather API client
//!
//! This module provides HTTP client functionality for the two OpenWeather
//! endpoints the application consumes: the box/city lookup that lists the
//! cities inside a bounding box, and the one-call endpoint that returns
//! detailed weather for a coordinate. Weather-detail requests are gated by
//! a process-wide [`RateLimiter`] honouring the free-tier request quota.

use crate::config::ApiConfig;
use crate::models::openweather::{CityListResponse, WeatherSnapshot};
use crate::models::{CityRef, GeoRegion};
use crate::{Result, WeatherBoxError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Result cap sent with every box/city request, alongside the bbox
pub const CITY_LIST_LIMIT: u32 = 10;

/// OpenWeather free tier: 60 weather-detail requests per minute
pub const DEFAULT_QUOTA: u32 = 60;

/// Length of the rolling request-counting window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Counter and window start for the current counting window
#[derive(Debug)]
struct QuotaWindow {
    count: u32,
    started: Instant,
}

/// Rate limiter for weather-detail requests
///
/// Owns its counter and window start behind an async mutex so concurrent
/// batch workers cannot race the check-and-increment sequence. The gate
/// holds the lock across its pause, which stalls every other worker until
/// the window rolls over — the quota is global, so that is the point.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per window
    quota: u32,
    /// Window length
    window: Duration,
    /// Shared counting state
    state: Mutex<QuotaWindow>,
}

impl RateLimiter {
    /// Create a rate limiter with an explicit quota and window length
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            quota,
            window,
            state: Mutex::new(QuotaWindow {
                count: 0,
                started: Instant::now(),
            }),
        }
    }

    /// Create a rate limiter with the OpenWeather free-tier quota
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_QUOTA, DEFAULT_WINDOW)
    }

    /// Gate a weather-detail request; called once before every request.
    ///
    /// A lapsed window always grants a fresh budget, whether or not the
    /// quota was hit during it. A window with its quota exhausted pauses
    /// the caller for the remainder of the window, then resets.
    pub async fn block_if_exhausted(&self) {
        let mut state = self.state.lock().await;
        let elapsed = state.started.elapsed();

        if elapsed >= self.window {
            state.count = 0;
            state.started = Instant::now();
            return;
        }

        if state.count >= self.quota {
            let pause = self.window - elapsed;
            warn!(
                "Request quota exhausted ({} reqs/{}s), pausing for {:.1}s",
                self.quota,
                self.window.as_secs(),
                pause.as_secs_f64()
            );
            tokio::time::sleep(pause).await;
            state.count = 0;
            state.started = Instant::now();
        }
    }

    /// Count one request that returned a non-empty body
    pub async fn record_success(&self) {
        self.state.lock().await.count += 1;
    }

    /// Requests counted against the current window
    pub async fn issued(&self) -> u32 {
        self.state.lock().await.count
    }
}

/// One weather-detail fetch for a coordinate
///
/// Seam between the batch layer and the HTTP client; tests drive the batch
/// coordinator through stub implementations.
#[async_trait]
pub trait FetchWeather: Send + Sync {
    /// Fetch detailed weather for a coordinate. `Ok(None)` is the valid
    /// "no data" outcome for an empty provider response.
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<Option<WeatherSnapshot>>;
}

/// Weather API client for OpenWeather
pub struct OpenWeatherClient {
    /// HTTP client
    client: Client,
    /// API configuration
    config: ApiConfig,
    /// Rate limiter gating weather-detail requests
    rate_limiter: RateLimiter,
}

impl OpenWeatherClient {
    /// Create a new client with the free-tier rate limiter
    pub fn new(config: ApiConfig) -> Result<Self> {
        Self::with_rate_limiter(config, RateLimiter::with_defaults())
    }

    /// Create a new client with an injected rate limiter
    pub fn with_rate_limiter(config: ApiConfig, rate_limiter: RateLimiter) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("weatherbox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherBoxError::api(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| WeatherBoxError::config("OpenWeather API key is missing"))
    }

    /// List the cities inside a bounding box.
    ///
    /// Issues one GET against the box/city endpoint with the region's four
    /// bounds and the fixed result cap embedded in the query. An empty or
    /// missing result list is a valid outcome and yields an empty vec.
    #[instrument(skip(self, region))]
    pub async fn city_list(&self, region: &GeoRegion) -> Result<Vec<CityRef>> {
        let url = format!(
            "{}?bbox={},{},{},{},{}&appid={}",
            self.config.city_list_base_url,
            region.lon_min(),
            region.lat_min(),
            region.lon_max(),
            region.lat_max(),
            CITY_LIST_LIMIT,
            urlencoding::encode(self.api_key()?),
        );

        let response = self.get(&url).await?;
        let body: CityListResponse = response
            .json()
            .await
            .map_err(|e| WeatherBoxError::api(format!("Failed to parse city list response: {e}")))?;

        let cities: Vec<CityRef> = body
            .list
            .into_iter()
            .filter_map(|entry| entry.into_city_ref())
            .collect();

        info!("Found {} cities in the requested region", cities.len());
        Ok(cities)
    }

    /// Fetch detailed weather for a coordinate, gated by the rate limiter.
    ///
    /// An empty provider body is the "no data" outcome (`Ok(None)`) and is
    /// not counted against the quota. Transport failures surface as errors
    /// for the caller to handle.
    #[instrument(skip(self))]
    pub async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<Option<WeatherSnapshot>> {
        let url = format!(
            "{}?lat={}&lon={}&appid={}",
            self.config.weather_base_url,
            lat,
            lon,
            urlencoding::encode(self.api_key()?),
        );

        self.rate_limiter.block_if_exhausted().await;

        let response = self.get(&url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| WeatherBoxError::api(format!("Failed to read weather response: {e}")))?;

        let trimmed = body.trim_ascii();
        if trimmed.is_empty() || trimmed == b"null" || trimmed == b"{}" {
            warn!("Provider returned no weather data for {:.4}, {:.4}", lat, lon);
            return Ok(None);
        }

        let snapshot: WeatherSnapshot = serde_json::from_slice(trimmed)
            .map_err(|e| WeatherBoxError::api(format!("Failed to parse weather response: {e}")))?;

        self.rate_limiter.record_success().await;
        debug!(
            "Fetched weather for {:.4}, {:.4} ({} issued this window)",
            lat,
            lon,
            self.rate_limiter.issued().await
        );
        Ok(Some(snapshot))
    }

    /// Requests counted against the current quota window
    pub async fn requests_issued(&self) -> u32 {
        self.rate_limiter.issued().await
    }

    /// Issue one GET and map transport failures and non-2xx statuses
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!(
            "GET {}",
            url.split("appid=").next().unwrap_or(url).trim_end_matches('&')
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherBoxError::api(format!("Network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherBoxError::api(format!(
                "Request failed with status: {} - {}",
                status,
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl FetchWeather for OpenWeatherClient {
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<Option<WeatherSnapshot>> {
        OpenWeatherClient::fetch_weather(self, lat, lon).await
    }
}
