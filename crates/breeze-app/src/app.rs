use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use breeze_core::{AccuracyPreference, Config};
use breeze_location::{
    AccuracyLevel, EventBus, LocationSample, MainContext, PositioningProvider, RequestCoordinator,
    ThreadAffineProxy,
};
use breeze_weather::WeatherClient;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error_mapping::{from_location, from_weather};
use crate::features::{AirQualityFeature, WeatherFeature};
use crate::location_manager::LocationManager;

/// Name of the thread that owns the positioning provider
pub const MAIN_CONTEXT_NAME: &str = "breeze-main";

/// A unit of functionality wired to the shared services on startup
pub trait FeatureModule: Send + Sync {
    /// Unique identifier for this feature
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Start observing shared services
    fn attach(self: Arc<Self>, ctx: &FeatureContext) -> Result<()>;

    /// Release every subscription taken in `attach`
    fn detach(&self) -> Result<()>;
}

/// Services handed to features when they attach
#[derive(Clone)]
pub struct FeatureContext {
    pub config: Arc<Config>,
    pub bus: Arc<EventBus<LocationSample>>,
    pub runtime: Handle,
    pub shutdown: CancellationToken,
}

/// Main application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    context: Arc<MainContext>,
    coordinator: RequestCoordinator,
    location: Arc<LocationManager>,
    client: WeatherClient,
    weather: Arc<WeatherFeature>,
    air_quality: Arc<AirQualityFeature>,
    features: Vec<Arc<dyn FeatureModule>>,
    feature_context: FeatureContext,
    initialized: bool,
}

impl App {
    /// Wire the location stack and features around `provider`.
    pub fn new<P>(config: Config, provider: P, runtime: Handle) -> Result<Self>
    where
        P: PositioningProvider + 'static,
    {
        let config = Arc::new(config);

        let context = MainContext::spawn(MAIN_CONTEXT_NAME).map_err(from_location)?;
        let proxy = ThreadAffineProxy::new(context.clone(), provider);
        let bus = Arc::new(EventBus::new(context.clone()));
        let coordinator = RequestCoordinator::new(
            proxy,
            bus.clone(),
            accuracy_level(config.location.desired_accuracy),
        );
        let location = LocationManager::new(coordinator.clone());

        let client = WeatherClient::new(
            &config.weather.api_base_url,
            config.weather.api_key.clone(),
            Duration::from_secs(config.weather.request_timeout_secs),
        )
        .map_err(from_weather)?
        .with_forecast_days(config.weather.forecast_days);

        let weather = WeatherFeature::new(client.clone());
        let air_quality = AirQualityFeature::new(client.clone());
        let features: Vec<Arc<dyn FeatureModule>> = vec![
            weather.clone() as Arc<dyn FeatureModule>,
            air_quality.clone() as Arc<dyn FeatureModule>,
        ];

        let feature_context = FeatureContext {
            config: config.clone(),
            bus,
            runtime,
            shutdown: CancellationToken::new(),
        };

        Ok(Self {
            config,
            context,
            coordinator,
            location,
            client,
            weather,
            air_quality,
            features,
            feature_context,
            initialized: false,
        })
    }

    /// Register an additional feature; it is attached by `initialize`
    pub fn register_feature(&mut self, feature: Arc<dyn FeatureModule>) {
        tracing::info!("Registering feature: {}", feature.name());
        self.features.push(feature);
    }

    /// Attach all registered features
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        tracing::info!(
            "Initializing application with {} features",
            self.features.len()
        );

        for feature in &self.features {
            tracing::debug!("Attaching feature: {}", feature.name());
            feature.clone().attach(&self.feature_context)?;
        }

        self.initialized = true;
        tracing::info!("Application initialized successfully");
        Ok(())
    }

    /// Detach all features and abandon fetches still in flight
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        self.feature_context.shutdown.cancel();

        for feature in &self.features {
            tracing::debug!("Detaching feature: {}", feature.name());
            if let Err(e) = feature.detach() {
                tracing::error!("Error detaching feature {}: {}", feature.name(), e);
            }
        }

        self.initialized = false;
        Ok(())
    }

    /// Ask for the device location; features refresh when it is published
    pub fn refresh_location(&self) -> tokio::task::JoinHandle<()> {
        self.location.request_location(&self.feature_context.runtime)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &Arc<MainContext> {
        &self.context
    }

    pub fn bus(&self) -> &Arc<EventBus<LocationSample>> {
        &self.feature_context.bus
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    pub fn location(&self) -> &Arc<LocationManager> {
        &self.location
    }

    pub fn client(&self) -> &WeatherClient {
        &self.client
    }

    pub fn weather(&self) -> &Arc<WeatherFeature> {
        &self.weather
    }

    pub fn air_quality(&self) -> &Arc<AirQualityFeature> {
        &self.air_quality
    }

    pub fn features(&self) -> &[Arc<dyn FeatureModule>] {
        &self.features
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Convert the configured accuracy into the provider's level
pub fn accuracy_level(preference: AccuracyPreference) -> AccuracyLevel {
    match preference {
        AccuracyPreference::Best => AccuracyLevel::Best,
        AccuracyPreference::NearestTenMeters => AccuracyLevel::NearestTenMeters,
        AccuracyPreference::HundredMeters => AccuracyLevel::HundredMeters,
        AccuracyPreference::Kilometer => AccuracyLevel::Kilometer,
        AccuracyPreference::ThreeKilometers => AccuracyLevel::ThreeKilometers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breeze_location::SimulatedProvider;

    #[test]
    fn test_accuracy_conversion() {
        assert_eq!(accuracy_level(AccuracyPreference::Best), AccuracyLevel::Best);
        assert_eq!(
            accuracy_level(AccuracyPreference::Kilometer),
            AccuracyLevel::Kilometer
        );
    }

    #[tokio::test]
    async fn test_lifecycle_attaches_and_detaches_features() {
        let (provider, _handle) = SimulatedProvider::fixed(31.5, 74.3);
        let mut app = App::new(Config::default(), provider, Handle::current()).unwrap();

        let ids: Vec<_> = app.features().iter().map(|f| f.id().to_string()).collect();
        assert_eq!(ids, vec!["weather", "air_quality"]);
        assert_eq!(app.bus().subscriber_count(breeze_location::LOCATION_UPDATED), 0);

        app.initialize().unwrap();
        assert!(app.is_initialized());
        assert!(app.weather().is_attached());
        assert_eq!(app.bus().subscriber_count(breeze_location::LOCATION_UPDATED), 2);

        app.shutdown().unwrap();
        assert!(!app.air_quality().is_attached());
        assert_eq!(app.bus().subscriber_count(breeze_location::LOCATION_UPDATED), 0);
    }

    #[tokio::test]
    async fn test_bad_base_url_fails_construction() {
        let mut config = Config::default();
        config.weather.api_base_url = "not a url".to_string();
        let (provider, _handle) = SimulatedProvider::fixed(0.0, 0.0);

        assert!(App::new(config, provider, Handle::current()).is_err());
    }
}
