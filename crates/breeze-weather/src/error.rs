/// Weather client errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Server returned status code {0}")]
    ServerError(u16),
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_message() {
        assert_eq!(
            WeatherError::ServerError(500).to_string(),
            "Server returned status code 500"
        );
    }
}
