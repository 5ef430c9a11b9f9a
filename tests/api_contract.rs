//! HTTP contract tests for the OpenWeather client
//!
//! Run against a local mock server: query construction, empty-result
//! handling, and transport-error surfacing.

use weatherbox::config::ApiConfig;
use weatherbox::{GeoRegion, OpenWeatherClient, WeatherBoxError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        api_key: Some("test-api-key".to_string()),
        city_list_base_url: format!("{}/data/2.5/box/city", server.uri()),
        weather_base_url: format!("{}/data/3.0/onecall", server.uri()),
        timeout_seconds: 5,
    }
}

const CITY_LIST_BODY: &str = r#"{
    "cod": 200,
    "list": [
        {"id": 5128581, "name": "New York", "coord": {"Lat": 40.7128, "Lon": -74.006}},
        {"id": 5099133, "name": "Hoboken", "coord": {"Lat": 40.743, "Lon": -74.0324}}
    ]
}"#;

const ONECALL_BODY: &str = r#"{
    "lat": 40.7128,
    "lon": -74.006,
    "timezone": "America/New_York",
    "timezone_offset": -18000,
    "current": {
        "dt": 1700000000,
        "temp": 295.48,
        "feels_like": 295.0,
        "pressure": 1014,
        "humidity": 64,
        "visibility": 10000,
        "wind_speed": 3.6,
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}]
    },
    "hourly": [
        {"dt": 1700000000, "temp": 295.48, "weather": [{"description": "broken clouds"}]}
    ]
}"#;

#[tokio::test]
async fn test_city_list_query_places_bounds_in_documented_order() {
    let server = MockServer::start().await;

    // bbox = lon_min,lat_min,lon_max,lat_max,<cap>
    Mock::given(method("GET"))
        .and(path("/data/2.5/box/city"))
        .and(query_param("bbox", "-74.5,40.5,-73.5,41,10"))
        .and(query_param("appid", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CITY_LIST_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(test_config(&server)).unwrap();
    let region = GeoRegion::new(41.0, 40.5, -74.5, -73.5).unwrap();

    let cities = client.city_list(&region).await.unwrap();
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].name, "New York");
    assert_eq!(cities[0].lat, 40.7128);
    assert_eq!(cities[0].lon, -74.006);
}

#[tokio::test]
async fn test_empty_city_list_is_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/box/city"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"cod": 200, "list": []}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(test_config(&server)).unwrap();
    let region = GeoRegion::new(1.0, 0.0, 0.0, 1.0).unwrap();

    let cities = client.city_list(&region).await.unwrap();
    assert!(cities.is_empty());
}

#[tokio::test]
async fn test_city_list_transport_failure_surfaces() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/box/city"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(test_config(&server)).unwrap();
    let region = GeoRegion::new(1.0, 0.0, 0.0, 1.0).unwrap();

    let result = client.city_list(&region).await;
    match result {
        Err(WeatherBoxError::Api { message }) => assert!(message.contains("500")),
        other => panic!("Expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_weather_fetch_sends_coordinate_and_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .and(query_param("lat", "40.7128"))
        .and(query_param("lon", "-74.006"))
        .and(query_param("appid", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ONECALL_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(test_config(&server)).unwrap();
    let snapshot = client.fetch_weather(40.7128, -74.006).await.unwrap();

    let snapshot = snapshot.expect("non-empty body must produce a snapshot");
    assert_eq!(snapshot.timezone, "America/New_York");
    assert_eq!(client.requests_issued().await, 1);
}

#[tokio::test]
async fn test_empty_weather_body_is_no_data_and_uncounted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "application/json"))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(test_config(&server)).unwrap();
    let snapshot = client.fetch_weather(1.0, 2.0).await.unwrap();

    assert!(snapshot.is_none());
    // "No data" responses are not counted against the request quota
    assert_eq!(client.requests_issued().await, 0);
}

#[tokio::test]
async fn test_malformed_weather_body_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(test_config(&server)).unwrap();
    let result = client.fetch_weather(1.0, 2.0).await;
    assert!(matches!(result, Err(WeatherBoxError::Api { .. })));
}

#[tokio::test]
async fn test_missing_api_key_fails_before_any_request() {
    let server = MockServer::start().await;

    let mut config = test_config(&server);
    config.api_key = None;
    let client = OpenWeatherClient::new(config).unwrap();
    let region = GeoRegion::new(1.0, 0.0, 0.0, 1.0).unwrap();

    assert!(matches!(
        client.city_list(&region).await,
        Err(WeatherBoxError::Config { .. })
    ));
    assert!(matches!(
        client.fetch_weather(1.0, 2.0).await,
        Err(WeatherBoxError::Config { .. })
    ));

    // Nothing reached the server
    assert!(server.received_requests().await.unwrap().is_empty());
}
