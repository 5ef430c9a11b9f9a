//! Terminal front end for `weatherbox`
//!
//! Takes the four bounding-box coordinates, looks up the cities inside the
//! box, then runs an interactive menu: fetch weather for one city, fetch
//! all cities in parallel or in sequence, and dump the fetched results to
//! JSON files. All the actual work happens in the library modules.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weatherbox::{
    BatchCoordinator, BatchMode, BatchResult, GeoRegion, OpenWeatherClient, WeatherBoxConfig,
    WeatherBoxError, persist_batch, report,
};

const USAGE: &str = "Usage: weatherbox <lat_top> <lat_bottom> <lon_left> <lon_right>";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = WeatherBoxConfig::load().with_context(|| "Failed to load configuration")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let region = parse_region(&args).map_err(|e| {
        eprintln!("{}", e.user_message());
        eprintln!("{USAGE}");
        e
    })?;

    let client = Arc::new(
        OpenWeatherClient::new(config.api.clone())
            .with_context(|| "Failed to create OpenWeather client")?,
    );

    let cities = match client.city_list(&region).await {
        Ok(cities) => cities,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e).with_context(|| "City lookup failed");
        }
    };

    print!("{}", report::city_list_text(&cities));
    if cities.is_empty() {
        return Ok(());
    }
    println!("'fetch <n>' selects the n-th listed city (1-based).");

    let coordinator = BatchCoordinator::new(client.clone());
    let mut fetched = BatchResult::new();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!();
        println!("Commands: fetch <n> | all | seq | dump | quit");
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut words = line.split_whitespace();

        match words.next() {
            Some("fetch") => {
                let selection = words.next().unwrap_or_default();
                match select_city(&cities, selection) {
                    Ok(city) => match client.fetch_weather(city.lat, city.lon).await {
                        Ok(snapshot) => {
                            println!("Selected City: {}", city.name);
                            print!("{}", report::weather_text(&city.name, snapshot.as_ref()));
                        }
                        Err(e) => eprintln!("{}", e.user_message()),
                    },
                    Err(e) => eprintln!("{}", e.user_message()),
                }
            }
            Some("all") => {
                let outcome = coordinator.run(&cities, BatchMode::Parallel).await;
                print!(
                    "{}",
                    report::batch_summary_text(outcome.results.len(), outcome.elapsed.as_secs_f64())
                );
                fetched = outcome.results;
            }
            Some("seq") => {
                let outcome = coordinator.run(&cities, BatchMode::Sequential).await;
                print!(
                    "{}",
                    report::batch_summary_text(outcome.results.len(), outcome.elapsed.as_secs_f64())
                );
                fetched = outcome.results;
            }
            Some("dump") => {
                if fetched.is_empty() {
                    println!("Nothing fetched yet; run 'all' or 'seq' first.");
                    continue;
                }
                let report = persist_batch(&fetched, Path::new(&config.storage.output_dir));
                println!("Wrote {} file(s):", report.written.len());
                for path in &report.written {
                    println!("  {}", path.display());
                }
                if let Some((path, e)) = &report.failed {
                    eprintln!("Failed on {}: {}", path.display(), e.user_message());
                }
            }
            Some("quit") | Some("q") => break,
            Some(other) => println!("Unknown command: {other}"),
            None => {}
        }
    }

    info!("Exiting");
    Ok(())
}

/// Parse the four bounding-box arguments in their user-facing order
fn parse_region(args: &[String]) -> std::result::Result<GeoRegion, WeatherBoxError> {
    if args.len() != 4 {
        return Err(WeatherBoxError::validation(format!(
            "Expected 4 coordinates (lat_top lat_bottom lon_left lon_right), got {}",
            args.len()
        )));
    }

    let mut bounds = [0.0f64; 4];
    for (value, arg) in bounds.iter_mut().zip(args) {
        *value = arg
            .parse::<f64>()
            .map_err(|_| WeatherBoxError::validation(format!("Not a number: '{arg}'")))?;
    }

    GeoRegion::new(bounds[0], bounds[1], bounds[2], bounds[3])
}

/// Resolve a `fetch` selection: a 1-based index into the city list
fn select_city<'a>(
    cities: &'a [weatherbox::CityRef],
    selection: &str,
) -> std::result::Result<&'a weatherbox::CityRef, WeatherBoxError> {
    let index: usize = selection
        .parse()
        .map_err(|_| WeatherBoxError::validation(format!("Not a city number: '{selection}'")))?;
    cities
        .get(index.wrapping_sub(1))
        .ok_or_else(|| WeatherBoxError::validation(format!("No city numbered {index}")))
}
