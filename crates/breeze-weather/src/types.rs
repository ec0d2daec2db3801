use serde::{Deserialize, Serialize};

/// Resolved place reported by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// Local time at the place, `YYYY-MM-DD HH:MM`
    pub localtime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
}

/// Current conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Current {
    pub temp_c: f64,
    pub temp_f: f64,
    pub condition: Condition,
    pub humidity: i32,
    pub wind_kph: f64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub feelslike_c: f64,
}

/// Body of `current.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub location: Location,
    pub current: Current,
}

/// Pollutant concentrations (μg/m³) and the US EPA index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    #[serde(rename = "us-epa-index")]
    pub us_epa_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiCurrent {
    pub air_quality: AirQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyAqi {
    /// `YYYY-MM-DD HH:MM`
    pub time: String,
    pub air_quality: AirQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiForecastDay {
    pub hour: Vec<HourlyAqi>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiForecast {
    pub forecastday: Vec<AqiForecastDay>,
}

/// Body of `forecast.json?aqi=yes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiResponse {
    pub location: Location,
    pub current: AqiCurrent,
    pub forecast: AqiForecast,
}

impl AqiResponse {
    /// US EPA index of the current reading.
    pub fn current_epa_index(&self) -> i32 {
        self.current.air_quality.us_epa_index
    }
}
