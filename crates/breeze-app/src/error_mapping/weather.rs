use breeze_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError};
use breeze_weather::WeatherError as ClientError;

pub fn from_weather(e: ClientError) -> AppError {
    match e {
        ClientError::InvalidQuery(s) => AppError::Weather(WeatherError::InvalidQuery(s)),
        // WeatherAPI answers 400 when no place matches the query
        ClientError::ServerError(400) => AppError::Weather(WeatherError::InvalidQuery(
            "no matching location".to_string(),
        )),
        ClientError::ServerError(401 | 403) => AppError::Weather(WeatherError::InvalidApiKey),
        ClientError::ServerError(status) if status >= 500 => {
            AppError::Network(NetworkError::ServerError {
                status,
                message: format!("Server returned status code {}", status),
            })
        }
        ClientError::ServerError(status) => {
            AppError::Weather(WeatherError::ApiError(format!("status {}", status)))
        }
        ClientError::Decode(s) => AppError::Network(NetworkError::InvalidResponse(s)),
        ClientError::Network(e) => AppError::Network(e.into_network_error()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            from_weather(ClientError::ServerError(401)),
            AppError::Weather(WeatherError::InvalidApiKey)
        ));
        assert!(matches!(
            from_weather(ClientError::ServerError(400)),
            AppError::Weather(WeatherError::InvalidQuery(_))
        ));
        assert!(matches!(
            from_weather(ClientError::ServerError(503)),
            AppError::Network(NetworkError::ServerError { status: 503, .. })
        ));
        assert!(matches!(
            from_weather(ClientError::ServerError(418)),
            AppError::Weather(WeatherError::ApiError(_))
        ));
    }

    #[test]
    fn test_decode_failure_is_invalid_response() {
        let err = from_weather(ClientError::Decode("missing field".into()));
        assert_eq!(
            err.user_message(),
            "Received an unexpected response. Please try again."
        );
    }
}
