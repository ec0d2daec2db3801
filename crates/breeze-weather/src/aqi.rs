//! AQI presentation helpers: EPA categories and PM2.5 chart series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::AqiResponse;

/// US EPA air-quality category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl AqiCategory {
    /// Map a US EPA index (1-6) to its category
    pub fn from_epa_index(index: i32) -> Self {
        match index {
            1 => Self::Good,
            2 => Self::Moderate,
            3 => Self::UnhealthyForSensitiveGroups,
            4 => Self::Unhealthy,
            5 => Self::VeryUnhealthy,
            6 => Self::Hazardous,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
            Self::Unknown => "Unknown",
        }
    }

    /// Display color name
    pub fn color(&self) -> &'static str {
        match self {
            Self::Good => "green",
            Self::Moderate => "yellow",
            Self::UnhealthyForSensitiveGroups => "orange",
            Self::Unhealthy => "red",
            Self::VeryUnhealthy => "purple",
            Self::Hazardous => "brown",
            Self::Unknown => "gray",
        }
    }
}

/// Span of forecast hours shown in the PM2.5 chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    #[default]
    Day,
    Week,
}

impl TimeFrame {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "24 Hours",
            Self::Week => "3 Days",
        }
    }
}

/// One point of the PM2.5 series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub pm2_5: f64,
}

/// PM2.5 readings for the selected time frame.
///
/// `Day` covers the first forecast day labelled `HH:MM`; `Week` covers every
/// forecast day with the full timestamp as label.
pub fn chart_data(response: &AqiResponse, frame: TimeFrame) -> Vec<ChartPoint> {
    let days = &response.forecast.forecastday;
    match frame {
        TimeFrame::Day => days
            .first()
            .map(|day| {
                day.hour
                    .iter()
                    .map(|h| ChartPoint {
                        label: hour_label(&h.time),
                        pm2_5: h.air_quality.pm2_5,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        TimeFrame::Week => days
            .iter()
            .flat_map(|day| day.hour.iter())
            .map(|h| ChartPoint {
                label: h.time.clone(),
                pm2_5: h.air_quality.pm2_5,
            })
            .collect(),
    }
}

/// `"2025-01-08 13:00"` -> `"13:00"`; unparsable input is kept whole.
fn hour_label(time: &str) -> String {
    match NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M") {
        Ok(t) => t.format("%H:%M").to_string(),
        Err(_) => time
            .split_whitespace()
            .nth(1)
            .unwrap_or(time)
            .to_string(),
    }
}
