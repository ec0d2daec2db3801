//! Positioning provider contract.
//!
//! A provider is the platform service that knows the device position. It is
//! driven by pull-style calls (`start_updates`, `request_authorization`) and
//! answers through push-style callbacks on its delegate.

use std::sync::Weak;

use crate::types::{AccuracyLevel, AuthorizationState, LocationSample, ProviderError};

/// Push callbacks a provider invokes on its delegate.
pub trait LocationDelegate: Send + Sync {
    /// One or more fixes arrived; the first is the one acted upon.
    fn on_location_update(&self, samples: &[LocationSample]);

    /// The provider failed to produce a fix.
    fn on_error(&self, error: ProviderError);

    /// The user or system changed the authorization state.
    fn on_authorization_changed(&self);
}

/// A platform positioning service.
///
/// Implementations may assume every method is called from the same thread;
/// `ThreadAffineProxy` guarantees it.
pub trait PositioningProvider: Send {
    fn authorization_state(&self) -> AuthorizationState;

    /// Install the delegate. The provider must not keep it alive.
    fn set_delegate(&mut self, delegate: Weak<dyn LocationDelegate>);

    fn set_desired_accuracy(&mut self, accuracy: AccuracyLevel);

    /// Ask the user for permission; the answer arrives via `on_authorization_changed`.
    fn request_authorization(&mut self);

    fn start_updates(&mut self);

    fn stop_updates(&mut self);
}
