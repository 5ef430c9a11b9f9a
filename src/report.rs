//! Text rendering of city lists and weather snapshots
//!
//! The formatting the front end prints. Kept out of `main` so the exact
//! output (unit conversions included) is testable without a terminal.

use crate::models::CityRef;
use crate::models::openweather::WeatherSnapshot;
use chrono::DateTime;
use std::fmt::Write;

/// Hourly forecast rows shown per snapshot
pub const HOURLY_DISPLAY_LIMIT: usize = 5;

/// Render a city-list lookup result. An empty lookup is an explicit
/// "no cities" message, never blank output.
#[must_use]
pub fn city_list_text(cities: &[CityRef]) -> String {
    if cities.is_empty() {
        return "There are no cities in the given region\n".to_string();
    }

    let mut text = String::new();
    for city in cities {
        let _ = writeln!(text, "City: {}", city.name);
    }
    text
}

/// Render a weather snapshot for display. `None` renders the explicit
/// "no data" outcome.
#[must_use]
pub fn weather_text(city: &str, snapshot: Option<&WeatherSnapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return format!("No weather data available for {city}.\n");
    };

    let mut text = String::new();
    let _ = writeln!(text, "Current Weather in {city}:");
    let _ = writeln!(text, "Timezone: {}", snapshot.timezone_leaf());

    match &snapshot.current {
        Some(current) => {
            let _ = writeln!(text, "Temperature: {:.2} °C", current.temp_celsius());
            if let Some(feels_like) = current.feels_like_celsius() {
                let _ = writeln!(text, "Feels Like: {feels_like:.2} °C");
            }
            if let Some(description) = current.weather.first() {
                let _ = writeln!(text, "Weather: {}", capitalize(&description.description));
            }
            if let Some(humidity) = current.humidity {
                let _ = writeln!(text, "Humidity: {humidity}%");
            }
            if let Some(wind_speed) = current.wind_speed {
                let _ = writeln!(text, "Wind Speed: {wind_speed} m/s");
            }
            if let Some(pressure) = current.pressure {
                let _ = writeln!(text, "Pressure: {pressure} hPa");
            }
            if let Some(visibility_km) = current.visibility_km() {
                let _ = writeln!(text, "Visibility: {visibility_km:.1} km");
            }
        }
        None => {
            let _ = writeln!(text, "No current conditions reported.");
        }
    }

    if !snapshot.hourly.is_empty() {
        let _ = writeln!(text);
        let _ = writeln!(text, "Hourly Forecast:");
        let _ = writeln!(
            text,
            "{:<15} {:<20} {:<30}",
            "Time", "Temperature (°C)", "Weather"
        );
        let _ = writeln!(text, "{}", "-".repeat(50));

        for hour in snapshot.hourly.iter().take(HOURLY_DISPLAY_LIMIT) {
            let time = DateTime::from_timestamp(hour.dt, 0)
                .map(|dt| dt.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            let description = hour
                .weather
                .first()
                .map(|w| capitalize(&w.description))
                .unwrap_or_default();
            let _ = writeln!(
                text,
                "{:<15} {:<20.2} {:<30}",
                time,
                hour.temp_celsius(),
                description
            );
        }
    }

    text
}

/// Render the user-facing summary of a completed batch run
#[must_use]
pub fn batch_summary_text(fetched: usize, elapsed_secs: f64) -> String {
    format!("Requests completed in: {elapsed_secs:.2} second(s), {fetched} cities fetched\n")
}

/// Upper-case the first character, the way the provider's lower-case
/// descriptions are displayed.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
