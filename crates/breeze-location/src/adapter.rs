use std::sync::Weak;

use crate::coordinator::CoordinatorInner;
use crate::provider::LocationDelegate;
use crate::types::{LocationSample, ProviderError};

/// Delegate installed on the provider for one location request.
///
/// Owned by the pending request it belongs to; the provider only holds a weak
/// reference, so once the request resolves the adapter is gone and late
/// callbacks fall on the floor.
pub struct CallbackAdapter {
    request_id: u64,
    coordinator: Weak<CoordinatorInner>,
}

impl CallbackAdapter {
    pub(crate) fn new(request_id: u64, coordinator: Weak<CoordinatorInner>) -> Self {
        Self {
            request_id,
            coordinator,
        }
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }
}

impl LocationDelegate for CallbackAdapter {
    fn on_location_update(&self, samples: &[LocationSample]) {
        let Some(sample) = samples.first().copied() else {
            tracing::debug!("Empty location update for request {}", self.request_id);
            return;
        };
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.handle_location(self.request_id, sample);
        }
    }

    fn on_error(&self, error: ProviderError) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.handle_error(self.request_id, error);
        }
    }

    fn on_authorization_changed(&self) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.handle_authorization_changed(self.request_id);
        }
    }
}

impl std::fmt::Debug for CallbackAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackAdapter")
            .field("request_id", &self.request_id)
            .finish()
    }
}
