//! Batch weather fetching for every city in a bounding box
//!
//! The coordinator drives one [`FetchWeather`] implementation over a set of
//! cities, either strictly sequentially or through a bounded pool of
//! concurrent workers, and collects the successful snapshots into a map
//! keyed by city name. Per-city failures are logged and skipped; they never
//! abort the rest of the batch.

use crate::api::FetchWeather;
use crate::models::CityRef;
use crate::models::openweather::WeatherSnapshot;
use chrono::Local;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Width of the concurrent worker pool in parallel mode
pub const PARALLEL_WORKERS: usize = 8;

/// Timestamp format used for batch stamps and dump file names
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%dT%H_%M_%S";

/// How a batch run schedules its per-city fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// One fetch at a time, in city order
    Sequential,
    /// Up to [`PARALLEL_WORKERS`] fetches in flight, merged in completion order
    Parallel,
}

/// Weather fetched for one city during a batch run
#[derive(Debug, Clone)]
pub struct CityWeather {
    /// The provider payload for this city
    pub snapshot: WeatherSnapshot,
    /// Batch-start timestamp; every entry of one run shares it
    pub fetched_at: String,
}

/// Successful results of one batch run, keyed by city name
pub type BatchResult = HashMap<String, CityWeather>;

/// Result map plus the wall-clock duration of the run
#[derive(Debug)]
pub struct BatchOutcome {
    /// Entries for the cities whose fetch succeeded and returned data
    pub results: BatchResult,
    /// Wall-clock duration of the whole batch, for user-facing reporting
    pub elapsed: Duration,
}

/// Drives weather fetches over a set of cities
pub struct BatchCoordinator {
    fetcher: Arc<dyn FetchWeather>,
    workers: usize,
}

impl BatchCoordinator {
    /// Create a coordinator with the default worker-pool width
    pub fn new(fetcher: Arc<dyn FetchWeather>) -> Self {
        Self {
            fetcher,
            workers: PARALLEL_WORKERS,
        }
    }

    /// Run one batch over `cities`.
    ///
    /// Returns a fresh result map each run. One timestamp is captured at
    /// batch start and stamped onto every entry, so all files later dumped
    /// from this run share a logical fetch time even though the individual
    /// network calls complete at different real times.
    pub async fn run(&self, cities: &[CityRef], mode: BatchMode) -> BatchOutcome {
        let started = Instant::now();
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let plan = dedupe_cities(cities);

        info!(
            "Starting {:?} batch over {} cities (stamp {})",
            mode,
            plan.len(),
            timestamp
        );

        let results = match mode {
            BatchMode::Sequential => self.run_sequential(&plan, &timestamp).await,
            BatchMode::Parallel => self.run_parallel(&plan, &timestamp).await,
        };

        let elapsed = started.elapsed();
        info!(
            "Batch completed: {}/{} cities in {:.2}s",
            results.len(),
            plan.len(),
            elapsed.as_secs_f64()
        );

        BatchOutcome { results, elapsed }
    }

    async fn run_sequential(&self, cities: &[CityRef], timestamp: &str) -> BatchResult {
        let mut results = BatchResult::new();
        for city in cities {
            let outcome = self.fetcher.fetch_weather(city.lat, city.lon).await;
            merge_outcome(&mut results, &city.name, outcome, timestamp);
        }
        results
    }

    async fn run_parallel(&self, cities: &[CityRef], timestamp: &str) -> BatchResult {
        let mut completed = futures::stream::iter(cities.iter().map(|city| {
            let fetcher = Arc::clone(&self.fetcher);
            async move {
                let outcome = fetcher.fetch_weather(city.lat, city.lon).await;
                (city.name.clone(), outcome)
            }
        }))
        .buffer_unordered(self.workers);

        let mut results = BatchResult::new();
        while let Some((name, outcome)) = completed.next().await {
            merge_outcome(&mut results, &name, outcome, timestamp);
        }
        results
    }
}

/// Merge one per-city outcome into the result map. Failures and empty
/// responses are logged and leave no entry behind.
fn merge_outcome(
    results: &mut BatchResult,
    name: &str,
    outcome: crate::Result<Option<WeatherSnapshot>>,
    timestamp: &str,
) {
    match outcome {
        Ok(Some(snapshot)) => {
            results.insert(
                name.to_string(),
                CityWeather {
                    snapshot,
                    fetched_at: timestamp.to_string(),
                },
            );
        }
        Ok(None) => {
            warn!("No weather data returned for {}", name);
        }
        Err(e) => {
            warn!("An error occurred for {}: {}", name, e);
        }
    }
}

/// Build the fetch plan from a lookup result, keeping the first occurrence
/// of a duplicated city name. Two distinct cities can share a name within
/// one region; overwriting the earlier one silently would fetch the wrong
/// coordinate under that name, so later duplicates are dropped loudly.
pub fn dedupe_cities(cities: &[CityRef]) -> Vec<CityRef> {
    let mut seen: HashMap<&str, &CityRef> = HashMap::new();
    let mut plan = Vec::with_capacity(cities.len());

    for city in cities {
        match seen.get(city.name.as_str()) {
            Some(first) => {
                warn!(
                    "Duplicate city name '{}' at {:.4}, {:.4}; keeping first occurrence at {:.4}, {:.4}",
                    city.name, city.lat, city.lon, first.lat, first.lon
                );
            }
            None => {
                seen.insert(city.name.as_str(), city);
                plan.push(city.clone());
            }
        }
    }

    plan
}
