//! WeatherAPI client for Breeze
//!
//! Current conditions and air-quality forecasts for a free-text place name or
//! a `"lat,lon"` pair, plus helpers for presenting AQI readings.

pub mod aqi;
pub mod client;
pub mod error;
pub mod types;

pub use aqi::{chart_data, AqiCategory, ChartPoint, TimeFrame};
pub use client::WeatherClient;
pub use error::WeatherError;
pub use types::*;
