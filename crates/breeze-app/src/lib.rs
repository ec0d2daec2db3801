//! Feature layer of Breeze: weather and air-quality modules driven by the
//! location event bus, the `LocationManager` and the `App` lifecycle.

pub mod app;
pub mod error_mapping;
pub mod features;
pub mod location_manager;

pub use app::{accuracy_level, App, FeatureContext, FeatureModule, MAIN_CONTEXT_NAME};
pub use features::{AirQualityFeature, FeatureState, WeatherFeature};
pub use location_manager::{LocationManager, LocationState};
