//! Weather dashboard core for SkyDeck
//!
//! Tracks a list of cities with simulated weather readings, refreshes them
//! on demand and turns records into display-ready values.

pub mod catalog;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod format;
pub mod source;
pub mod state;
pub mod store;
pub mod types;

pub use dashboard::{Dashboard, DashboardSnapshot, QuickStats};
pub use error::WeatherError;
pub use format::{
    condition_label, format_date, format_temperature, format_time, is_extreme_weather,
    temperature_color, weather_icon, wind_direction, CompassPoint, TemperatureBand,
};
pub use source::{Clock, FixedClock, Jitter, SimulatedSource, SystemClock, WeatherSource};
pub use state::LoadState;
pub use store::{RefreshOutcome, RefreshTicket, SharedStore, WeatherStore, FETCH_ERROR_MESSAGE};
pub use types::*;
