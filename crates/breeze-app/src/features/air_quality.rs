use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use breeze_location::Subscription;
use breeze_weather::{chart_data, AqiCategory, AqiResponse, ChartPoint, TimeFrame, WeatherClient};
use parking_lot::{Mutex, RwLock};

use super::state::{FeatureState, Loader};
use super::LocationDriven;
use crate::app::{FeatureContext, FeatureModule};
use crate::error_mapping::from_weather;

/// Air quality and the PM2.5 forecast for the device location.
pub struct AirQualityFeature {
    client: WeatherClient,
    loader: Loader<AqiResponse>,
    time_frame: RwLock<TimeFrame>,
    subscription: Mutex<Option<Subscription>>,
}

impl AirQualityFeature {
    pub fn new(client: WeatherClient) -> Arc<Self> {
        Arc::new(Self {
            client,
            loader: Loader::new(),
            time_frame: RwLock::new(TimeFrame::default()),
            subscription: Mutex::new(None),
        })
    }

    pub async fn fetch(&self, query: &str) {
        let generation = self.loader.begin();
        self.load(generation, query).await;
    }

    async fn load(&self, generation: u64, query: &str) {
        let result = self.client.fetch_air_quality(query).await.map_err(|e| {
            let err = from_weather(e);
            tracing::warn!("AQI fetch for '{}' failed: {}", query, err);
            format!("Failed to fetch AQI data: {}", err.user_message())
        });
        self.loader.finish(generation, result);
    }

    pub fn time_frame(&self) -> TimeFrame {
        *self.time_frame.read()
    }

    pub fn set_time_frame(&self, frame: TimeFrame) {
        *self.time_frame.write() = frame;
    }

    /// PM2.5 series for the selected time frame; empty without data.
    pub fn chart_data(&self) -> Vec<ChartPoint> {
        let frame = self.time_frame();
        self.loader.with(|s| {
            s.data
                .as_ref()
                .map(|data| chart_data(data, frame))
                .unwrap_or_default()
        })
    }

    /// Category of the current reading.
    pub fn category(&self) -> Option<AqiCategory> {
        self.loader.with(|s| {
            s.data
                .as_ref()
                .map(|data| AqiCategory::from_epa_index(data.current_epa_index()))
        })
    }

    pub fn state(&self) -> FeatureState<AqiResponse> {
        self.loader.snapshot()
    }

    pub fn data(&self) -> Option<AqiResponse> {
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

impl LocationDriven for AirQualityFeature {
    type Data = AqiResponse;

    fn loader(&self) -> &Loader<AqiResponse> {
        &self.loader
    }

    fn refresh(&self, generation: u64, query: &str) -> impl Future<Output = ()> + Send {
        self.load(generation, query)
    }
}

impl FeatureModule for AirQualityFeature {
    fn id(&self) -> &str {
        "air_quality"
    }

    fn name(&self) -> &str {
        "Air Quality"
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
