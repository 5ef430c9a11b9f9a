//! Persistence of batch results as per-city JSON files
//!
//! Each city's snapshot lands in a sub-directory named after the last
//! segment of its reported timezone, in a file named from the city and the
//! batch timestamp. Re-running a dump with unchanged input overwrites the
//! same files with identical content. There is no cross-file atomicity: a
//! write failure aborts the remaining files and the report says which paths
//! made it to disk and which one failed.

use crate::batch::{BatchResult, CityWeather};
use crate::{Result, WeatherBoxError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Outcome of one dump pass over a batch result
#[derive(Debug, Default)]
pub struct PersistReport {
    /// Files written, in city-name order
    pub written: Vec<PathBuf>,
    /// The path that failed and its error, when the dump was cut short
    pub failed: Option<(PathBuf, WeatherBoxError)>,
}

impl PersistReport {
    /// Whether every entry made it to disk
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Dump every entry of a batch result under `base_dir`.
///
/// Layout: `<base_dir>/<timezone-leaf>_timezone/<city>_<timestamp>.json`.
/// Directories are created as needed. Entries are written in city-name
/// order. The first failure stops the dump; nothing is rolled back.
pub fn persist_batch(results: &BatchResult, base_dir: &Path) -> PersistReport {
    let mut report = PersistReport::default();

    let mut entries: Vec<(&String, &CityWeather)> = results.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (city_name, entry) in entries {
        let dir = base_dir.join(format!("{}_timezone", entry.snapshot.timezone_leaf()));
        let path = dir.join(format!("{}_{}.json", city_name, entry.fetched_at));

        match write_snapshot(&dir, &path, entry) {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                report.written.push(path);
            }
            Err(e) => {
                error!("Aborting dump after failure on {}: {}", path.display(), e);
                report.failed = Some((path, e));
                break;
            }
        }
    }

    info!(
        "Dumped {}/{} weather files under {}",
        report.written.len(),
        results.len(),
        base_dir.display()
    );
    report
}

fn write_snapshot(dir: &Path, path: &Path, entry: &CityWeather) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| WeatherBoxError::Persistence {
        path: dir.to_path_buf(),
        source,
    })?;

    let json = serde_json::to_vec(&entry.snapshot).map_err(|e| WeatherBoxError::Persistence {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    fs::write(path, json).map_err(|source| WeatherBoxError::Persistence {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::openweather::WeatherSnapshot;

    fn entry(timezone: &str, stamp: &str) -> CityWeather {
        let snapshot: WeatherSnapshot = serde_json::from_str(&format!(
            r#"{{"timezone":"{timezone}","current":{{"temp":280.0}}}}"#
        ))
        .unwrap();
        CityWeather {
            snapshot,
            fetched_at: stamp.to_string(),
        }
    }

    fn sample_batch() -> BatchResult {
        let mut results = BatchResult::new();
        results.insert(
            "New York".to_string(),
            entry("America/New_York", "2024_01_31T12_00_00"),
        );
        results.insert(
            "Hoboken".to_string(),
            entry("America/New_York", "2024_01_31T12_00_00"),
        );
        results.insert(
            "Berlin".to_string(),
            entry("Europe/Berlin", "2024_01_31T12_00_00"),
        );
        results
    }

    #[test]
    fn test_same_timezone_leaf_shares_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let report = persist_batch(&sample_batch(), tmp.path());

        assert!(report.is_complete());
        assert_eq!(report.written.len(), 3);

        let ny_dir = tmp.path().join("New_York_timezone");
        assert!(ny_dir.join("New York_2024_01_31T12_00_00.json").exists());
        assert!(ny_dir.join("Hoboken_2024_01_31T12_00_00.json").exists());
        assert!(
            tmp.path()
                .join("Berlin_timezone")
                .join("Berlin_2024_01_31T12_00_00.json")
                .exists()
        );
    }

    #[test]
    fn test_written_files_hold_the_snapshot_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let report = persist_batch(&sample_batch(), tmp.path());

        let path = report
            .written
            .iter()
            .find(|p| p.to_string_lossy().contains("Berlin"))
            .unwrap();
        let body = fs::read_to_string(path).unwrap();
        let snapshot: WeatherSnapshot = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot.timezone, "Europe/Berlin");
        assert_eq!(snapshot.current.unwrap().temp, 280.0);
    }

    #[test]
    fn test_persist_twice_overwrites_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let batch = sample_batch();

        let first = persist_batch(&batch, tmp.path());
        let second = persist_batch(&batch, tmp.path());

        assert!(first.is_complete());
        assert!(second.is_complete());
        assert_eq!(first.written.len(), second.written.len());

        // Still exactly one file per city
        let ny_files = fs::read_dir(tmp.path().join("New_York_timezone"))
            .unwrap()
            .count();
        assert_eq!(ny_files, 2);
    }

    #[test]
    fn test_failure_is_reported_not_silent() {
        let tmp = tempfile::tempdir().unwrap();
        // A file standing where a directory must be created makes the dump fail
        fs::write(tmp.path().join("Berlin_timezone"), b"in the way").unwrap();

        let mut results = BatchResult::new();
        results.insert(
            "Berlin".to_string(),
            entry("Europe/Berlin", "2024_01_31T12_00_00"),
        );
        let report = persist_batch(&results, tmp.path());

        assert!(!report.is_complete());
        assert!(report.written.is_empty());
        let (path, err) = report.failed.as_ref().unwrap();
        assert!(path.to_string_lossy().contains("Berlin_timezone"));
        assert!(matches!(err, WeatherBoxError::Persistence { .. }));
    }

    #[test]
    fn test_dump_keeps_unmodeled_provider_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot: WeatherSnapshot = serde_json::from_str(
            r#"{
                "timezone": "Europe/Berlin",
                "current": {"temp": 280.0, "dew_point": 275.5, "uvi": 1.1},
                "daily": [{"dt": 1700000000, "temp": {"day": 281.0}}],
                "minutely": [{"dt": 1700000000, "precipitation": 0}],
                "alerts": [{"event": "Wind Advisory"}]
            }"#,
        )
        .unwrap();
        let mut results = BatchResult::new();
        results.insert(
            "Berlin".to_string(),
            CityWeather {
                snapshot,
                fetched_at: "2024_01_31T12_00_00".to_string(),
            },
        );

        let report = persist_batch(&results, tmp.path());
        assert!(report.is_complete());

        let body = fs::read_to_string(&report.written[0]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["daily"][0]["temp"]["day"], 281.0);
        assert_eq!(value["minutely"][0]["precipitation"], 0);
        assert_eq!(value["alerts"][0]["event"], "Wind Advisory");
        assert_eq!(value["current"]["dew_point"], 275.5);
        assert_eq!(value["current"]["uvi"], 1.1);
    }

    #[test]
    fn test_written_paths_are_in_city_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        let report = persist_batch(&sample_batch(), tmp.path());

        let names: Vec<String> = report
            .written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Berlin_2024_01_31T12_00_00.json",
                "Hoboken_2024_01_31T12_00_00.json",
                "New York_2024_01_31T12_00_00.json",
            ]
        );
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let report = persist_batch(&BatchResult::new(), tmp.path());
        assert!(report.is_complete());
        assert!(report.written.is_empty());
    }
}
