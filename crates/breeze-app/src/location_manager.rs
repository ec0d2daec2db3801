//! Observable holder of the most recent device location.

use std::sync::Arc;

use breeze_location::{LocationError, LocationSample, RequestCoordinator};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error_mapping::from_location;

#[derive(Debug, Clone, Default)]
pub struct LocationState {
    pub location: Option<LocationSample>,
    pub error: Option<LocationError>,
}

pub struct LocationManager {
    coordinator: RequestCoordinator,
    state: RwLock<LocationState>,
}

impl LocationManager {
    pub fn new(coordinator: RequestCoordinator) -> Arc<Self> {
        Arc::new(Self {
            coordinator,
            state: RwLock::new(LocationState::default()),
        })
    }

    /// Acquire a fresh location and record the outcome.
    ///
    /// A request superseded by a newer one leaves the state alone; the newer
    /// request records its own outcome.
    pub async fn refresh(&self) -> Result<LocationSample, LocationError> {
        let result = self.coordinator.request_location().await;

        match &result {
            Ok(sample) => {
                let mut state = self.state.write();
                state.location = Some(*sample);
                state.error = None;
            }
            Err(LocationError::InProgress) => {
                tracing::debug!("Location refresh superseded");
            }
            Err(e) => {
                tracing::warn!("Location refresh failed: {}", e);
                let mut state = self.state.write();
                state.location = None;
                state.error = Some(e.clone());
            }
        }

        result
    }

    /// Start a refresh on `runtime` without waiting for it.
    pub fn request_location(self: &Arc<Self>, runtime: &Handle) -> JoinHandle<()> {
        let manager = self.clone();
        runtime.spawn(async move {
            let _ = manager.refresh().await;
        })
    }

    pub fn state(&self) -> LocationState {
        self.state.read().clone()
    }

    pub fn location(&self) -> Option<LocationSample> {
        self.state.read().location
    }

    pub fn error(&self) -> Option<LocationError> {
        self.state.read().error.clone()
    }

    /// User-facing message for the last failure.
    pub fn error_message(&self) -> Option<&'static str> {
        self.error().map(|e| from_location(e).user_message())
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }
}
