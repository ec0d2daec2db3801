//! End-to-end feature behavior: simulated location, mocked WeatherAPI.

use std::time::Duration;

use breeze_app::App;
use breeze_core::Config;
use breeze_location::{AuthorizationState, LocationError, SimulatedProvider};
use breeze_weather::{AqiCategory, TimeFrame};
use tokio::runtime::Handle;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn location() -> serde_json::Value {
    serde_json::json!({
        "name": "Lahore",
        "region": "Punjab",
        "country": "Pakistan",
        "lat": 31.5,
        "lon": 74.3,
        "localtime": "2025-01-08 13:45"
    })
}

fn air_quality(epa: i32, pm2_5: f64) -> serde_json::Value {
    serde_json::json!({
        "co": 400.5, "no2": 20.1, "o3": 60.0, "so2": 5.2,
        "pm2_5": pm2_5, "pm10": 50.0, "us-epa-index": epa
    })
}

fn current_body() -> serde_json::Value {
    serde_json::json!({
        "location": location(),
        "current": {
            "temp_c": 21.5,
            "temp_f": 70.7,
            "condition": {"text": "Sunny", "icon": "//cdn.weatherapi.com/113.png"},
            "humidity": 60,
            "wind_kph": 11.2,
            "wind_dir": "NW",
            "pressure_mb": 1015.0,
            "feelslike_c": 21.0
        }
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "location": location(),
        "current": {"air_quality": air_quality(3, 35.4)},
        "forecast": {"forecastday": [
            {"hour": [
                {"time": "2025-01-08 00:00", "air_quality": air_quality(2, 12.0)},
                {"time": "2025-01-08 01:00", "air_quality": air_quality(2, 14.0)}
            ]},
            {"hour": [
                {"time": "2025-01-09 00:00", "air_quality": air_quality(4, 60.0)}
            ]}
        ]}
    })
}

fn config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.weather.api_base_url = format!("{}/v1", server.uri());
    config.weather.api_key = "test-key".to_string();
    config.weather.request_timeout_secs = 5;
    config
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

async fn mount_ok(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_location_update_refreshes_both_features() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("q", "31.5,74.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("q", "31.5,74.3"))
        .and(query_param("aqi", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (provider, _handle) = SimulatedProvider::fixed(31.5, 74.3);
    let mut app = App::new(config(&server), provider, Handle::current()).unwrap();
    app.initialize().unwrap();

    app.refresh_location().await.unwrap();
    app.context().flush().await;

    let weather = app.weather().clone();
    let aqi = app.air_quality().clone();
    wait_until(|| weather.data().is_some() && aqi.data().is_some()).await;

    let state = weather.state();
    assert!(!state.loading);
    assert!(state.error_message.is_none());
    assert_eq!(state.data.map(|d| d.current.temp_c), Some(21.5));
    assert_eq!(aqi.category(), Some(AqiCategory::UnhealthyForSensitiveGroups));
    assert_eq!(
        app.location().location().map(|l| (l.latitude, l.longitude)),
        Some((31.5, 74.3))
    );

    app.shutdown().unwrap();
}

#[tokio::test]
async fn test_server_error_sets_feature_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (provider, _handle) = SimulatedProvider::fixed(31.5, 74.3);
    let mut app = App::new(config(&server), provider, Handle::current()).unwrap();
    app.initialize().unwrap();

    app.refresh_location().await.unwrap();
    app.context().flush().await;

    let weather = app.weather().clone();
    let aqi = app.air_quality().clone();
    wait_until(|| weather.error_message().is_some() && aqi.error_message().is_some()).await;

    assert_eq!(
        weather.error_message().as_deref(),
        Some("Failed to fetch weather data: The server is experiencing issues. Please try again later.")
    );
    assert_eq!(
        aqi.error_message().as_deref(),
        Some("Failed to fetch AQI data: The server is experiencing issues. Please try again later.")
    );
    assert!(!weather.is_loading());
    assert!(!aqi.is_loading());
    assert!(weather.data().is_none());
}

#[tokio::test]
async fn test_denied_location_never_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(0)
        .mount(&server)
        .await;

    let (provider, _handle) = SimulatedProvider::new(AuthorizationState::Denied);
    let mut app = App::new(config(&server), provider, Handle::current()).unwrap();
    app.initialize().unwrap();

    app.refresh_location().await.unwrap();
    app.context().flush().await;

    assert_eq!(app.location().error(), Some(LocationError::Unauthorized));
    assert!(!app.weather().is_loading());
    assert!(app.weather().data().is_none());
}

#[tokio::test]
async fn test_search_fetches_place_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("q", "Lahore"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (provider, _handle) = SimulatedProvider::new(AuthorizationState::Restricted);
    let app = App::new(config(&server), provider, Handle::current()).unwrap();

    app.weather().set_search_text("Lahore");
    app.weather().search().await;

    let data = app.weather().data().unwrap();
    assert_eq!(data.current.humidity, 60);
    assert_eq!(data.location.name, "Lahore");
}

#[tokio::test]
async fn test_empty_search_reports_invalid_query() {
    let server = MockServer::start().await;
    let (provider, _handle) = SimulatedProvider::new(AuthorizationState::Restricted);
    let app = App::new(config(&server), provider, Handle::current()).unwrap();

    app.weather().search().await;

    assert_eq!(
        app.weather().error_message().as_deref(),
        Some("Failed to fetch weather data: Location not recognized. Check and try again.")
    );
}

#[tokio::test]
async fn test_chart_follows_time_frame() {
    let server = MockServer::start().await;
    mount_ok(&server).await;

    let (provider, _handle) = SimulatedProvider::new(AuthorizationState::Restricted);
    let app = App::new(config(&server), provider, Handle::current()).unwrap();
    let aqi = app.air_quality();

    assert!(aqi.chart_data().is_empty());
    aqi.fetch("Lahore").await;

    assert_eq!(aqi.time_frame(), TimeFrame::Day);
    let day = aqi.chart_data();
    assert_eq!(day.len(), 2);
    assert_eq!(day[1].label, "01:00");

    aqi.set_time_frame(TimeFrame::Week);
    let week = aqi.chart_data();
    assert_eq!(week.len(), 3);
    assert_eq!(week[2].pm2_5, 60.0);
}

#[tokio::test]
async fn test_detached_features_ignore_location_updates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(0)
        .mount(&server)
        .await;

    let (provider, _handle) = SimulatedProvider::fixed(31.5, 74.3);
    let mut app = App::new(config(&server), provider, Handle::current()).unwrap();
    app.initialize().unwrap();
    app.shutdown().unwrap();

    app.refresh_location().await.unwrap();
    app.context().flush().await;

    assert!(app.location().location().is_some());
    assert!(!app.weather().is_loading());
    assert!(app.weather().data().is_none());
}

#[tokio::test]
async fn test_shutdown_clears_loading_of_abandoned_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let (provider, _handle) = SimulatedProvider::fixed(31.5, 74.3);
    let mut app = App::new(config(&server), provider, Handle::current()).unwrap();
    app.initialize().unwrap();

    app.refresh_location().await.unwrap();
    app.context().flush().await;

    let weather = app.weather().clone();
    let aqi = app.air_quality().clone();
    wait_until(|| weather.is_loading() && aqi.is_loading()).await;

    app.shutdown().unwrap();

    wait_until(|| !weather.is_loading() && !aqi.is_loading()).await;
    assert!(weather.error_message().is_none());
    assert!(aqi.data().is_none());
}
