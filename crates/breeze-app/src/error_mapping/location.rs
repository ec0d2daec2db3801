use breeze_core::{AppError, LocationError};
use breeze_location::LocationError as RequestError;

pub fn from_location(e: RequestError) -> AppError {
    match e {
        RequestError::Unauthorized => AppError::Location(LocationError::PermissionDenied),
        RequestError::Unknown => AppError::Location(LocationError::ServiceUnavailable),
        RequestError::InProgress => AppError::Location(LocationError::Superseded),
        RequestError::SetupFailure(s) => AppError::Location(LocationError::SetupFailed(s)),
    }
}
