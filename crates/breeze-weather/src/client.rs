use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::WeatherError;
use crate::types::{AqiResponse, WeatherResponse};

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";
pub const DEFAULT_FORECAST_DAYS: u8 = 3;

/// WeatherAPI HTTP client
#[derive(Debug, Clone)]
pub struct WeatherClient {
    base_url: Url,
    client: Arc<Client>,
    api_key: String,
    forecast_days: u8,
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        // Endpoints are joined relative to the base, so it must end in '/'
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| WeatherError::InvalidQuery(format!("bad base URL '{}': {}", base_url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
            api_key: api_key.into(),
            forecast_days: DEFAULT_FORECAST_DAYS,
        })
    }

    pub fn with_forecast_days(mut self, days: u8) -> Self {
        self.forecast_days = days;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current conditions for a place name or `"lat,lon"`.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn fetch_weather(&self, query: &str) -> Result<WeatherResponse, WeatherError> {
        let url = self.endpoint("current.json", query, &[])?;
        let weather: WeatherResponse = self.get_json(url).await?;

        tracing::info!(
            "Fetched weather for {}: {}°C",
            weather.location.name,
            weather.current.temp_c
        );
        Ok(weather)
    }

    /// Current air quality plus hourly forecast for the configured number of days.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn fetch_air_quality(&self, query: &str) -> Result<AqiResponse, WeatherError> {
        let days = self.forecast_days.to_string();
        let url = self.endpoint("forecast.json", query, &[("aqi", "yes"), ("days", &days)])?;
        let aqi: AqiResponse = self.get_json(url).await?;

        tracing::info!(
            "Fetched AQI for {}: EPA index {}, {} forecast day(s)",
            aqi.location.name,
            aqi.current.air_quality.us_epa_index,
            aqi.forecast.forecastday.len()
        );
        Ok(aqi)
    }

    fn endpoint(&self, path: &str, query: &str, extra: &[(&str, &str)]) -> Result<Url, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::InvalidQuery("query is empty".to_string()));
        }

        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| WeatherError::InvalidQuery(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            pairs.append_pair("q", query);
            for (name, value) in extra {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, WeatherError> {
        tracing::debug!("GET {}{}", url.origin().ascii_serialization(), url.path());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Weather API returned status {}", status);
            return Err(WeatherError::ServerError(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| WeatherError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> WeatherClient {
        WeatherClient::new(base, "secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client(DEFAULT_BASE_URL)
            .endpoint("current.json", "London", &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://api.weatherapi.com/v1/current.json?key=secret&q=London"
        );
    }

    #[test]
    fn test_endpoint_encodes_place_names() {
        let url = client("http://api.weatherapi.com/v1/")
            .endpoint("current.json", "São Paulo & Rio", &[])
            .unwrap();
        let q: Vec<_> = url.query_pairs().filter(|(k, _)| k == "q").collect();
        assert_eq!(q[0].1, "São Paulo & Rio");
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_forecast_endpoint_parameters() {
        let url = client(DEFAULT_BASE_URL)
            .endpoint("forecast.json", "31.5,74.3", &[("aqi", "yes"), ("days", "3")])
            .unwrap();
        assert_eq!(url.path(), "/v1/forecast.json");
        assert_eq!(url.query(), Some("key=secret&q=31.5%2C74.3&aqi=yes&days=3"));
    }

    #[test]
    fn test_blank_query_is_invalid() {
        let result = client(DEFAULT_BASE_URL).endpoint("current.json", "   ", &[]);
        assert!(matches!(result, Err(WeatherError::InvalidQuery(_))));
    }

    #[test]
    fn test_bad_base_url_is_invalid() {
        let result = WeatherClient::new("not a url", "k", Duration::from_secs(1));
        assert!(matches!(result, Err(WeatherError::InvalidQuery(_))));
    }

    #[test]
    fn test_forecast_days_default() {
        assert_eq!(client(DEFAULT_BASE_URL).forecast_days, 3);
        assert_eq!(
            client(DEFAULT_BASE_URL).with_forecast_days(7).forecast_days,
            7
        );
    }
}
