//! Maps crate-level errors to breeze_core::AppError for consistent user-facing messages.
//! Both sides are foreign to this crate, so the mappings are plain functions.

mod location;
mod weather;

pub use location::from_location;
pub use weather::from_weather;
