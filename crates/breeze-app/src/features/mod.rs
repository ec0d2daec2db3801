//! Feature modules fed by the location event bus.

mod air_quality;
mod state;
mod weather;

pub use air_quality::AirQualityFeature;
pub use state::FeatureState;
pub use weather::WeatherFeature;

use std::future::Future;
use std::sync::Arc;

use breeze_location::{LocationSample, Subscription, LOCATION_UPDATED};

use crate::app::FeatureContext;
use state::Loader;

/// A feature that refetches its data for every published location.
pub(crate) trait LocationDriven: Send + Sync + 'static {
    type Data: Clone;

    fn loader(&self) -> &Loader<Self::Data>;

    /// Fetch for `query` and hand the outcome to `loader().finish(generation, ..)`.
    fn refresh(&self, generation: u64, query: &str) -> impl Future<Output = ()> + Send;
}

/// Subscribe `feature` to location updates.
///
/// The loading state is entered synchronously on the execution context and
/// the fetch is spawned on the runtime. Only a weak reference to the feature
/// is captured. A fetch still in flight at shutdown is abandoned and its
/// loading state cleared.
pub(crate) fn follow_location<T: LocationDriven>(
    ctx: &FeatureContext,
    feature: &Arc<T>,
) -> Subscription {
    let target = Arc::downgrade(feature);
    let runtime = ctx.runtime.clone();
    let shutdown = ctx.shutdown.clone();

    ctx.bus
        .subscribe(LOCATION_UPDATED, move |sample: &LocationSample| {
            let Some(feature) = target.upgrade() else {
                return;
            };
            let generation = feature.loader().begin();
            let query = sample.query();
            let shutdown = shutdown.clone();
            runtime.spawn(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        feature.loader().cancel(generation);
                        tracing::debug!("Fetch for '{}' abandoned at shutdown", query);
                    }
                    _ = feature.refresh(generation, &query) => {}
                }
            });
        })
}
