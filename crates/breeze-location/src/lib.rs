//! Location acquisition for Breeze.
//!
//! A `RequestCoordinator` turns a callback-driven `PositioningProvider` into a
//! single awaitable request. Every provider call is marshaled onto one
//! `MainContext` thread by the `ThreadAffineProxy`, and each acquired sample is
//! fanned out to subscribers through the `EventBus`.

pub mod adapter;
pub mod bus;
pub mod context;
pub mod coordinator;
pub mod provider;
pub mod proxy;
pub mod simulated;
pub mod state;
pub mod types;

pub use adapter::CallbackAdapter;
pub use bus::{EventBus, Subscription, LOCATION_UPDATED};
pub use context::MainContext;
pub use coordinator::RequestCoordinator;
pub use provider::{LocationDelegate, PositioningProvider};
pub use proxy::ThreadAffineProxy;
pub use simulated::{ProviderCall, SimulatedHandle, SimulatedProvider};
pub use state::RequestPhase;
pub use types::{AccuracyLevel, AuthorizationState, LocationError, LocationSample, ProviderError};
