use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use breeze_location::Subscription;
use breeze_weather::{WeatherClient, WeatherResponse};
use parking_lot::{Mutex, RwLock};

use super::state::{FeatureState, Loader};
use super::LocationDriven;
use crate::app::{FeatureContext, FeatureModule};
use crate::error_mapping::from_weather;

/// Current conditions for the device location or a searched place.
pub struct WeatherFeature {
    client: WeatherClient,
    loader: Loader<WeatherResponse>,
    search_text: RwLock<String>,
    subscription: Mutex<Option<Subscription>>,
}

impl WeatherFeature {
    pub fn new(client: WeatherClient) -> Arc<Self> {
        Arc::new(Self {
            client,
            loader: Loader::new(),
            search_text: RwLock::new(String::new()),
            subscription: Mutex::new(None),
        })
    }

    /// Fetch current conditions for a place name or `"lat,lon"`.
    pub async fn fetch(&self, query: &str) {
        let generation = self.loader.begin();
        self.load(generation, query).await;
    }

    async fn load(&self, generation: u64, query: &str) {
        let result = self.client.fetch_weather(query).await.map_err(|e| {
            let err = from_weather(e);
            tracing::warn!("Weather fetch for '{}' failed: {}", query, err);
            format!("Failed to fetch weather data: {}", err.user_message())
        });
        self.loader.finish(generation, result);
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        *self.search_text.write() = text.into();
    }

    pub fn search_text(&self) -> String {
        self.search_text.read().clone()
    }

    /// Fetch whatever is in the search box.
    pub async fn search(&self) {
        let query = self.search_text();
        self.fetch(&query).await;
    }

    pub fn state(&self) -> FeatureState<WeatherResponse> {
        self.loader.snapshot()
    }

    pub fn data(&self) -> Option<WeatherResponse> {
        self.loader.with(|s| s.data.clone())
    }

    pub fn error_message(&self) -> Option<String> {
        self.loader.with(|s| s.error_message.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.loader.with(|s| s.loading)
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.lock().is_some()
    }
}

impl LocationDriven for WeatherFeature {
    type Data = WeatherResponse;

    fn loader(&self) -> &Loader<WeatherResponse> {
        &self.loader
    }

    fn refresh(&self, generation: u64, query: &str) -> impl Future<Output = ()> + Send {
        self.load(generation, query)
    }
}

impl FeatureModule for WeatherFeature {
    fn id(&self) -> &str {
        "weather"
    }

    fn name(&self) -> &str {
        "Weather"
    }

    fn attach(self: Arc<Self>, ctx: &FeatureContext) -> Result<()> {
        let subscription = super::follow_location(ctx, &self);
        *self.subscription.lock() = Some(subscription);
        Ok(())
    }

    fn detach(&self) -> Result<()> {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }
        Ok(())
    }
}
