//! Single-flight location requests over a callback-driven provider.
//!
//! `request_location` installs a fresh `CallbackAdapter` as the provider's
//! delegate, walks the authorization state and then suspends until the
//! adapter reports a sample or an error. A newer request always fails the
//! older one with `LocationError::InProgress` before it touches the provider.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::instrument;

use crate::adapter::CallbackAdapter;
use crate::bus::{EventBus, LOCATION_UPDATED};
use crate::provider::LocationDelegate;
use crate::proxy::ThreadAffineProxy;
use crate::state::RequestPhase;
use crate::types::{AccuracyLevel, AuthorizationState, LocationError, LocationSample, ProviderError};

type Responder = oneshot::Sender<Result<LocationSample, LocationError>>;
type Receiver = oneshot::Receiver<Result<LocationSample, LocationError>>;

/// The one outstanding caller. Resolving consumes it, so it resolves at most once.
struct PendingRequest {
    id: u64,
    phase: RequestPhase,
    responder: Responder,
    adapter: Arc<CallbackAdapter>,
}

impl PendingRequest {
    fn resolve(self, result: Result<LocationSample, LocationError>) {
        let id = self.id;
        if let Err(e) = &result {
            tracing::debug!("Location request {} failed: {}", id, e);
        }
        if self.responder.send(result).is_err() {
            tracing::debug!("Location request {} was abandoned by its caller", id);
        }
        drop(self.adapter);
    }
}

#[derive(Default)]
struct Slot {
    pending: Option<PendingRequest>,
    last_id: u64,
}

pub(crate) struct CoordinatorInner {
    proxy: ThreadAffineProxy,
    bus: Arc<EventBus<LocationSample>>,
    accuracy: AccuracyLevel,
    slot: Mutex<Slot>,
    // Serializes the configure-and-start sequence across requests
    setup: tokio::sync::Mutex<()>,
}

/// Bridges a `PositioningProvider` into an awaitable, single-flight request.
#[derive(Clone)]
pub struct RequestCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl RequestCoordinator {
    pub fn new(
        proxy: ThreadAffineProxy,
        bus: Arc<EventBus<LocationSample>>,
        accuracy: AccuracyLevel,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                proxy,
                bus,
                accuracy,
                slot: Mutex::new(Slot::default()),
                setup: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Acquire one fresh location fix.
    ///
    /// Supersedes any request still in flight. There is no timeout: a provider
    /// that never answers leaves the caller suspended until a newer request
    /// replaces this one.
    #[instrument(skip(self), level = "debug")]
    pub async fn request_location(&self) -> Result<LocationSample, LocationError> {
        let (id, delegate, receiver) = self.inner.begin();

        {
            let _setup = self.inner.setup.lock().await;
            if self.inner.is_current(id) {
                if let Err(e) = self.inner.configure(id, delegate).await {
                    self.inner.fail(id, e);
                }
            }
        }

        receiver.await.unwrap_or_else(|_| {
            Err(LocationError::SetupFailure(
                "location request dropped without a result".to_string(),
            ))
        })
    }

    /// Current phase of the in-flight request, `Idle` if there is none.
    pub fn phase(&self) -> RequestPhase {
        self.inner
            .slot
            .lock()
            .pending
            .as_ref()
            .map_or(RequestPhase::Idle, |p| p.phase)
    }

    pub fn bus(&self) -> &Arc<EventBus<LocationSample>> {
        &self.inner.bus
    }
}

impl CoordinatorInner {
    /// Supersede the current request (if any) and install a new one.
    fn begin(self: &Arc<Self>) -> (u64, Weak<dyn LocationDelegate>, Receiver) {
        let mut slot = self.slot.lock();

        if let Some(previous) = slot.pending.take() {
            tracing::info!("Location request {} superseded", previous.id);
            previous.resolve(Err(LocationError::InProgress));
        }

        slot.last_id += 1;
        let id = slot.last_id;
        let adapter = Arc::new(CallbackAdapter::new(id, Arc::downgrade(self)));
        let delegate: Weak<dyn LocationDelegate> = Arc::downgrade(&adapter) as _;
        let (responder, receiver) = oneshot::channel();

        slot.pending = Some(PendingRequest {
            id,
            phase: RequestPhase::Requesting,
            responder,
            adapter,
        });
        tracing::debug!("Location request {} started", id);

        (id, delegate, receiver)
    }

    async fn configure(
        &self,
        id: u64,
        delegate: Weak<dyn LocationDelegate>,
    ) -> Result<(), LocationError> {
        self.proxy.set_delegate(delegate).await?;
        self.proxy.set_desired_accuracy(self.accuracy).await?;

        let authorization = self.proxy.authorization_state().await?;
        tracing::debug!("Request {}: authorization is {:?}", id, authorization);

        match authorization {
            AuthorizationState::Undetermined => {
                // Phase flips first: the provider may answer from inside the call
                if self.transition(id, RequestPhase::on_authorization_requested) {
                    self.proxy.request_authorization().await?;
                }
                Ok(())
            }
            AuthorizationState::AuthorizedLimited | AuthorizationState::AuthorizedFull => {
                if self.is_current(id) {
                    self.proxy.start_updates().await?;
                }
                Ok(())
            }
            AuthorizationState::Denied | AuthorizationState::Restricted => {
                Err(LocationError::Unauthorized)
            }
            AuthorizationState::Unknown => Err(LocationError::Unknown),
        }
    }

    fn is_current(&self, id: u64) -> bool {
        self.slot
            .lock()
            .pending
            .as_ref()
            .is_some_and(|p| p.id == id)
    }

    /// Apply `step` to the phase of request `id` if it is still current.
    fn transition(&self, id: u64, step: fn(RequestPhase) -> RequestPhase) -> bool {
        let mut slot = self.slot.lock();
        match slot.pending.as_mut() {
            Some(pending) if pending.id == id => {
                pending.phase = step(pending.phase);
                true
            }
            _ => false,
        }
    }

    /// Move request `id` out of `AwaitingAuthorization`. True exactly once per request.
    fn resume_authorized(&self, id: u64) -> bool {
        let mut slot = self.slot.lock();
        match slot.pending.as_mut() {
            Some(pending) if pending.id == id && pending.phase.awaits_authorization() => {
                pending.phase = pending.phase.on_authorized();
                true
            }
            _ => false,
        }
    }

    fn take(&self, id: u64) -> Option<PendingRequest> {
        let mut slot = self.slot.lock();
        match slot.pending.as_ref() {
            Some(pending) if pending.id == id => slot.pending.take(),
            _ => None,
        }
    }

    /// Take request `id` after a fix arrived, queueing `stop_updates` under the
    /// slot lock so it lands before any newer request's `start_updates`.
    fn complete(&self, id: u64) -> Option<PendingRequest> {
        let mut slot = self.slot.lock();
        match slot.pending.as_ref() {
            Some(pending) if pending.id == id => {
                self.proxy.dispatch(|provider| provider.stop_updates());
                slot.pending.take()
            }
            _ => None,
        }
    }

    fn fail(&self, id: u64, error: LocationError) {
        match self.take(id) {
            Some(pending) => pending.resolve(Err(error)),
            None => tracing::debug!("Dropping error for stale request {}: {}", id, error),
        }
    }

    pub(crate) fn handle_location(&self, id: u64, sample: LocationSample) {
        let Some(pending) = self.complete(id) else {
            tracing::debug!("Ignoring location for stale request {}", id);
            return;
        };

        tracing::info!(
            "Location acquired: {}, {}",
            sample.latitude,
            sample.longitude
        );

        // Caller first, then subscribers
        pending.resolve(Ok(sample));
        self.bus.publish(LOCATION_UPDATED, sample);
    }

    pub(crate) fn handle_error(&self, id: u64, error: ProviderError) {
        tracing::warn!("Positioning provider error for request {}: {}", id, error);
        self.fail(id, error.into());
    }

    pub(crate) fn handle_authorization_changed(self: &Arc<Self>, id: u64) {
        let awaiting = self
            .slot
            .lock()
            .pending
            .as_ref()
            .is_some_and(|p| p.id == id && p.phase.awaits_authorization());
        if !awaiting {
            tracing::debug!("Ignoring authorization change for request {}", id);
            return;
        }

        let coordinator = Arc::downgrade(self);
        self.proxy.dispatch(move |provider| {
            let Some(coordinator) = coordinator.upgrade() else {
                return;
            };
            let authorization = provider.authorization_state();
            tracing::debug!("Request {}: authorization changed to {:?}", id, authorization);

            if authorization.is_authorized() {
                if coordinator.resume_authorized(id) {
                    provider.start_updates();
                }
            } else if authorization.is_refused() {
                coordinator.fail(id, LocationError::Unauthorized);
            }
        });
    }
}
