//! A scriptable positioning provider.
//!
//! Used where no platform positioning service exists (the command-line binary
//! with a configured fixed position) and by tests, which drive the delegate
//! callbacks through a `SimulatedHandle`.

use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;

use crate::provider::{LocationDelegate, PositioningProvider};
use crate::types::{AccuracyLevel, AuthorizationState, LocationSample, ProviderError};

/// A provider method invocation, recorded in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCall {
    AuthorizationState,
    SetDelegate,
    SetDesiredAccuracy(AccuracyLevel),
    RequestAuthorization,
    StartUpdates,
    StopUpdates,
}

#[derive(Default)]
struct Shared {
    authorization: Option<AuthorizationState>,
    delegate: Option<Weak<dyn LocationDelegate>>,
    calls: Vec<(ProviderCall, Option<String>)>,
    updating: bool,
    fixed_position: Option<(f64, f64)>,
    grant_on_request: Option<AuthorizationState>,
}

impl Shared {
    fn record(&mut self, call: ProviderCall) {
        let thread_name = thread::current().name().map(str::to_string);
        self.calls.push((call, thread_name));
    }
}

pub struct SimulatedProvider {
    shared: Arc<Mutex<Shared>>,
}

/// Test/driver side of a `SimulatedProvider`.
#[derive(Clone)]
pub struct SimulatedHandle {
    shared: Arc<Mutex<Shared>>,
}

impl SimulatedProvider {
    /// Provider that reports `authorization` and stays silent until driven.
    pub fn new(authorization: AuthorizationState) -> (Self, SimulatedHandle) {
        let shared = Arc::new(Mutex::new(Shared {
            authorization: Some(authorization),
            ..Shared::default()
        }));
        (
            Self {
                shared: shared.clone(),
            },
            SimulatedHandle { shared },
        )
    }

    /// Authorized provider that reports the given position whenever updates start.
    pub fn fixed(latitude: f64, longitude: f64) -> (Self, SimulatedHandle) {
        let (provider, handle) = Self::new(AuthorizationState::AuthorizedFull);
        provider.shared.lock().fixed_position = Some((latitude, longitude));
        (provider, handle)
    }

    /// Answer `request_authorization` by switching to `state` and notifying the delegate.
    pub fn grant_on_request(self, state: AuthorizationState) -> Self {
        self.shared.lock().grant_on_request = Some(state);
        self
    }
}

impl PositioningProvider for SimulatedProvider {
    fn authorization_state(&self) -> AuthorizationState {
        let mut shared = self.shared.lock();
        shared.record(ProviderCall::AuthorizationState);
        shared.authorization.unwrap_or(AuthorizationState::Unknown)
    }

    fn set_delegate(&mut self, delegate: Weak<dyn LocationDelegate>) {
        let mut shared = self.shared.lock();
        shared.record(ProviderCall::SetDelegate);
        shared.delegate = Some(delegate);
    }

    fn set_desired_accuracy(&mut self, accuracy: AccuracyLevel) {
        self.shared
            .lock()
            .record(ProviderCall::SetDesiredAccuracy(accuracy));
    }

    fn request_authorization(&mut self) {
        let granted = {
            let mut shared = self.shared.lock();
            shared.record(ProviderCall::RequestAuthorization);
            match shared.grant_on_request.take() {
                Some(state) => {
                    shared.authorization = Some(state);
                    true
                }
                None => false,
            }
        };
        if granted {
            SimulatedHandle {
                shared: self.shared.clone(),
            }
            .notify_authorization_changed();
        }
    }

    fn start_updates(&mut self) {
        let fixed = {
            let mut shared = self.shared.lock();
            shared.record(ProviderCall::StartUpdates);
            shared.updating = true;
            shared.fixed_position
        };
        if let Some((latitude, longitude)) = fixed {
            SimulatedHandle {
                shared: self.shared.clone(),
            }
            .deliver(&[LocationSample::new(latitude, longitude)]);
        }
    }

    fn stop_updates(&mut self) {
        let mut shared = self.shared.lock();
        shared.record(ProviderCall::StopUpdates);
        shared.updating = false;
    }
}

impl SimulatedHandle {
    fn delegate(&self) -> Option<Arc<dyn LocationDelegate>> {
        // Upgrade outside the callback so the lock is not held while the delegate runs
        let weak = self.shared.lock().delegate.clone()?;
        weak.upgrade()
    }

    /// Push samples to the delegate. Returns false if no live delegate is installed.
    pub fn deliver(&self, samples: &[LocationSample]) -> bool {
        match self.delegate() {
            Some(delegate) => {
                delegate.on_location_update(samples);
                true
            }
            None => false,
        }
    }

    /// Push an error to the delegate. Returns false if no live delegate is installed.
    pub fn fail(&self, error: ProviderError) -> bool {
        match self.delegate() {
            Some(delegate) => {
                delegate.on_error(error);
                true
            }
            None => false,
        }
    }

    /// Change the authorization state and notify the delegate.
    pub fn set_authorization(&self, state: AuthorizationState) -> bool {
        self.shared.lock().authorization = Some(state);
        self.notify_authorization_changed()
    }

    fn notify_authorization_changed(&self) -> bool {
        match self.delegate() {
            Some(delegate) => {
                delegate.on_authorization_changed();
                true
            }
            None => false,
        }
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.shared.lock().calls.iter().map(|(c, _)| *c).collect()
    }

    /// Name of the thread each recorded call ran on.
    pub fn call_threads(&self) -> Vec<Option<String>> {
        self.shared
            .lock()
            .calls
            .iter()
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn count(&self, call: ProviderCall) -> usize {
        self.shared
            .lock()
            .calls
            .iter()
            .filter(|(c, _)| *c == call)
            .count()
    }

    pub fn is_updating(&self) -> bool {
        self.shared.lock().updating
    }

    /// True while the installed delegate is still alive.
    pub fn has_live_delegate(&self) -> bool {
        self.delegate().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        samples: Mutex<Vec<LocationSample>>,
    }

    impl LocationDelegate for Recorder {
        fn on_location_update(&self, samples: &[LocationSample]) {
            self.samples.lock().extend_from_slice(samples);
        }
        fn on_error(&self, _error: ProviderError) {}
        fn on_authorization_changed(&self) {}
    }

    #[test]
    fn test_fixed_provider_delivers_on_start() {
        let (mut provider, handle) = SimulatedProvider::fixed(31.5, 74.3);
        let recorder = Arc::new(Recorder {
            samples: Mutex::new(Vec::new()),
        });
        let delegate: Weak<dyn LocationDelegate> = Arc::downgrade(&recorder) as _;
        provider.set_delegate(delegate);

        provider.start_updates();

        let samples = recorder.samples.lock();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].latitude, 31.5);
        assert_eq!(samples[0].longitude, 74.3);
        assert!(handle.is_updating());
    }

    #[test]
    fn test_dropped_delegate_is_not_called() {
        let (mut provider, handle) = SimulatedProvider::new(AuthorizationState::AuthorizedFull);
        let recorder = Arc::new(Recorder {
            samples: Mutex::new(Vec::new()),
        });
        let delegate: Weak<dyn LocationDelegate> = Arc::downgrade(&recorder) as _;
        provider.set_delegate(delegate);
        drop(recorder);

        assert!(!handle.has_live_delegate());
        assert!(!handle.deliver(&[LocationSample::new(1.0, 2.0)]));
    }

    #[test]
    fn test_grant_on_request_switches_state() {
        let (mut provider, _handle) = SimulatedProvider::new(AuthorizationState::Undetermined);
        provider = provider.grant_on_request(AuthorizationState::AuthorizedLimited);

        provider.request_authorization();

        assert_eq!(
            provider.authorization_state(),
            AuthorizationState::AuthorizedLimited
        );
    }
}
