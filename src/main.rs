use std::time::Duration;

use anyhow::Result;
use breeze_app::App;
use breeze_core::{AppError, Config};
use breeze_location::{AuthorizationState, SimulatedProvider};
use breeze_weather::AqiCategory;
use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    breeze_core::init()?;

    let (config, _validation) = match Config::load_validated() {
        Ok(loaded) => loaded,
        Err(e) => {
            let err = AppError::from_anyhow(e);
            eprintln!("{}", err.user_message());
            return Err(err.into());
        }
    };
    if !config.weather.is_configured() {
        eprintln!(
            "No WeatherAPI key configured. Set {} or edit {}",
            breeze_core::config::API_KEY_ENV,
            config.config_dir.join("config.toml").display()
        );
    }

    let query = std::env::args().nth(1);
    let wait_limit = Duration::from_secs(config.weather.request_timeout_secs + 5);

    // Without a platform positioning service only a configured position is available
    let (provider, _handle) = match config.location.fixed_position {
        Some(position) => SimulatedProvider::fixed(position.latitude, position.longitude),
        None => SimulatedProvider::new(AuthorizationState::Restricted),
    };

    let mut app = App::new(config, provider, Handle::current())?;
    app.initialize()?;
    tracing::info!("Breeze started");

    match query {
        Some(query) => {
            tokio::join!(app.weather().fetch(&query), app.air_quality().fetch(&query));
        }
        None => {
            app.refresh_location().await?;
            match app.location().error_message() {
                Some(message) => eprintln!("Location unavailable: {}", message),
                None => wait_for_features(&app, wait_limit).await,
            }
        }
    }

    print_summary(&app);

    // Graceful shutdown
    app.shutdown()?;

    Ok(())
}

/// Wait until both features have settled after a location update.
async fn wait_for_features(app: &App, limit: Duration) {
    let settled = || {
        let weather = app.weather().state();
        let aqi = app.air_quality().state();
        !weather.loading
            && !aqi.loading
            && (weather.data.is_some() || weather.error_message.is_some())
            && (aqi.data.is_some() || aqi.error_message.is_some())
    };

    let waited = tokio::time::timeout(limit, async {
        while !settled() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    if waited.is_err() {
        tracing::warn!("Timed out waiting for weather data");
    }
}

fn print_summary(app: &App) {
    if let Some(location) = app.location().location() {
        println!("Location: {:.4}, {:.4}", location.latitude, location.longitude);
    }

    let weather = app.weather().state();
    if let Some(data) = &weather.data {
        let place = &data.location;
        let current = &data.current;
        println!("\n{}, {}, {}", place.name, place.region, place.country);
        println!("  Local time:  {}", place.localtime);
        println!(
            "  {}  {:.1}°C ({:.1}°F), feels like {:.1}°C",
            current.condition.text, current.temp_c, current.temp_f, current.feelslike_c
        );
        println!("  Humidity:    {}%", current.humidity);
        println!("  Wind:        {:.1} km/h {}", current.wind_kph, current.wind_dir);
        println!("  Pressure:    {:.0} mb", current.pressure_mb);
    }
    if let Some(message) = &weather.error_message {
        eprintln!("{}", message);
    }

    let aqi = app.air_quality();
    let state = aqi.state();
    if let Some(data) = &state.data {
        let reading = &data.current.air_quality;
        let category = AqiCategory::from_epa_index(reading.us_epa_index);
        println!(
            "\nAir quality: {} (US EPA {}, {})",
            category.label(),
            reading.us_epa_index,
            category.color()
        );
        println!(
            "  PM2.5 {:.1}  PM10 {:.1}  O3 {:.1}  NO2 {:.1}  SO2 {:.1}  CO {:.1}",
            reading.pm2_5, reading.pm10, reading.o3, reading.no2, reading.so2, reading.co
        );

        let frame = aqi.time_frame();
        println!("  PM2.5 forecast ({}):", frame.label());
        for point in aqi.chart_data() {
            println!("    {:>16}  {:.1}", point.label, point.pm2_5);
        }
    }
    if let Some(message) = &state.error_message {
        eprintln!("{}", message);
    }
}
