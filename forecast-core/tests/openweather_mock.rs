//! Integration tests for OpenWeatherProvider using wiremock.
//!
//! These run the provider, the query cache and aggregation end to end against a
//! mock forecast endpoint.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use forecast_core::{
    CurrentPolicy, Dashboard, ForecastProvider, ForecastQuery, QueryError,
    provider::openweather::OpenWeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry(dt: i64, dt_txt: &str, temp: f64, description: &str) -> serde_json::Value {
    serde_json::json!({
        "dt": dt,
        "main": {
            "temp": temp,
            "feels_like": temp - 1.0,
            "temp_min": temp,
            "temp_max": temp,
            "pressure": 1012,
            "humidity": 60
        },
        "weather": [{"id": 803, "main": "Clouds", "description": description, "icon": "04d"}],
        "clouds": {"all": 70},
        "wind": {"speed": 3.2, "deg": 180},
        "visibility": 10000,
        "pop": 0.1,
        "sys": {"pod": "d"},
        "dt_txt": dt_txt
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": 5,
        "list": [
            entry(1709294400, "2024-03-01 12:00:00", 20.0, "broken clouds"),
            entry(1709305200, "2024-03-01 15:00:00", 18.0, "scattered clouds"),
            entry(1709337600, "2024-03-02 00:00:00", 12.0, "overcast clouds"),
            entry(1709380800, "2024-03-02 12:00:00", 24.0, "few clouds"),
            entry(1709424000, "2024-03-03 00:00:00", 9.0, "light rain")
        ],
        "city": {
            "id": 2643743,
            "name": "London",
            "coord": {"lat": 51.5085, "lon": -0.1257},
            "country": "GB",
            "population": 1000000,
            "timezone": 0,
            "sunrise": 1709275000,
            "sunset": 1709315000
        }
    })
}

#[tokio::test]
async fn test_fetch_forecast_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("q", "London,GB"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("TEST_KEY".into()).with_base_url(mock_server.uri());
    let series = provider.fetch_forecast("London,GB").await.unwrap();

    assert_eq!(series.len(), 5);
    assert_eq!(series.location().display_name(), "London, GB");
    assert_eq!(series.location().utc_offset_secs, Some(0));
    assert_eq!(series.samples()[0].condition.description, "broken clouds");
    assert_eq!(series.samples()[4].temp_c, 9.0);
}

#[tokio::test]
async fn test_fetch_forecast_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("TEST_KEY".into()).with_base_url(mock_server.uri());
    let err = provider.fetch_forecast("Atlantis").await.unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("404"));
    assert!(msg.contains("city not found"));
}

#[tokio::test]
async fn test_fetch_forecast_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("TEST_KEY".into()).with_base_url(mock_server.uri());
    let err = provider.fetch_forecast("London").await.unwrap_err();

    assert!(err.to_string().contains("Failed to parse OpenWeather forecast JSON"));
}

#[tokio::test]
async fn test_query_caches_and_builds_dashboard() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("TEST_KEY".into()).with_base_url(mock_server.uri());
    let query = ForecastQuery::new(Box::new(provider), Duration::from_secs(60));

    let series = query.fetch("London").await.unwrap();
    let again = query.fetch("london").await.unwrap();
    assert_eq!(series, again);

    let now = Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap();
    let dashboard = Dashboard::build(&series, now, CurrentPolicy::First).unwrap();

    assert_eq!(dashboard.current.condition.description, "broken clouds");
    // Both of today's samples plus midnight, before the 06:00 cutoff.
    assert_eq!(dashboard.today.len(), 3);

    let outlook: Vec<(String, f64, f64)> = dashboard
        .outlook
        .iter()
        .map(|d| (d.date_key(), d.min_c, d.max_c))
        .collect();
    assert_eq!(
        outlook,
        vec![
            ("2024-03-02".to_string(), 12.0, 24.0),
            ("2024-03-03".to_string(), 9.0, 9.0),
        ]
    );
}

#[tokio::test]
async fn test_query_surfaces_upstream_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("BAD".into()).with_base_url(mock_server.uri());
    let query = ForecastQuery::new(Box::new(provider), Duration::from_secs(60));

    let err = query.fetch("London").await.unwrap_err();
    assert!(matches!(err, QueryError::Fetch(_)));
    assert!(err.to_string().contains("Invalid API key"));
}
