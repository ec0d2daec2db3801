use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorization state reported by the positioning provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    /// The user has not been asked yet
    Undetermined,
    /// Authorized while the app is in use
    AuthorizedLimited,
    /// Authorized at all times
    AuthorizedFull,
    Denied,
    /// Blocked by policy (parental controls, MDM)
    Restricted,
    /// A state this build does not recognize
    Unknown,
}

impl AuthorizationState {
    pub fn is_authorized(self) -> bool {
        matches!(self, Self::AuthorizedLimited | Self::AuthorizedFull)
    }

    pub fn is_refused(self) -> bool {
        matches!(self, Self::Denied | Self::Restricted)
    }
}

/// Accuracy requested from the positioning provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyLevel {
    #[default]
    Best,
    NearestTenMeters,
    HundredMeters,
    Kilometer,
    ThreeKilometers,
}

/// A single position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    /// Sample stamped with the current time.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }

    /// Weather API query string (`"{lat},{lon}"`).
    pub fn query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Failure of a location request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location access is not authorized")]
    Unauthorized,
    #[error("Location authorization state is unknown")]
    Unknown,
    #[error("Location request superseded by a newer request")]
    InProgress,
    #[error("Location provider setup failed: {0}")]
    SetupFailure(String),
}

/// Raw failure pushed by the positioning provider's error callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Location access denied by the user")]
    Denied,
    #[error("Location is currently unknown")]
    LocationUnknown,
    #[error("{0}")]
    Other(String),
}

impl From<ProviderError> for LocationError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Denied => LocationError::Unauthorized,
            ProviderError::LocationUnknown => LocationError::Unknown,
            ProviderError::Other(msg) => LocationError::SetupFailure(msg),
        }
    }
}
