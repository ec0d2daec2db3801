//! Marshaling layer between callers and the positioning provider.
//!
//! The provider lives behind the proxy and is only touched from jobs running
//! on the `MainContext`. No business logic lives here.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::context::MainContext;
use crate::provider::{LocationDelegate, PositioningProvider};
use crate::types::{AccuracyLevel, AuthorizationState, LocationError};

type SharedProvider = Arc<Mutex<Box<dyn PositioningProvider>>>;

/// Context-safe access to a `PositioningProvider`.
#[derive(Clone)]
pub struct ThreadAffineProxy {
    context: Arc<MainContext>,
    provider: SharedProvider,
}

impl ThreadAffineProxy {
    pub fn new<P>(context: Arc<MainContext>, provider: P) -> Self
    where
        P: PositioningProvider + 'static,
    {
        Self {
            context,
            provider: Arc::new(Mutex::new(Box::new(provider))),
        }
    }

    pub fn context(&self) -> &Arc<MainContext> {
        &self.context
    }

    /// Run `f` against the provider on the designated context and wait for its result.
    pub async fn run<F, R>(&self, f: F) -> Result<R, LocationError>
    where
        F: FnOnce(&mut dyn PositioningProvider) -> R + Send + 'static,
        R: Send + 'static,
    {
        let provider = self.provider.clone();
        self.context
            .run(move || {
                let mut guard = provider.lock();
                f(&mut **guard)
            })
            .await
    }

    /// Queue `f` against the provider on the designated context without waiting.
    pub fn dispatch<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut dyn PositioningProvider) + Send + 'static,
    {
        let provider = self.provider.clone();
        self.context.dispatch(move || {
            let mut guard = provider.lock();
            f(&mut **guard);
        })
    }

    pub async fn authorization_state(&self) -> Result<AuthorizationState, LocationError> {
        self.run(|p| p.authorization_state()).await
    }

    pub async fn set_delegate(
        &self,
        delegate: Weak<dyn LocationDelegate>,
    ) -> Result<(), LocationError> {
        self.run(move |p| p.set_delegate(delegate)).await
    }

    pub async fn set_desired_accuracy(&self, accuracy: AccuracyLevel) -> Result<(), LocationError> {
        self.run(move |p| p.set_desired_accuracy(accuracy)).await
    }

    pub async fn request_authorization(&self) -> Result<(), LocationError> {
        self.run(|p| p.request_authorization()).await
    }

    pub async fn start_updates(&self) -> Result<(), LocationError> {
        self.run(|p| p.start_updates()).await
    }

    pub async fn stop_updates(&self) -> Result<(), LocationError> {
        self.run(|p| p.stop_updates()).await
    }
}

impl std::fmt::Debug for ThreadAffineProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadAffineProxy")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
