use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use skydeck_weather::catalog::default_cities;
use skydeck_weather::forecast::{sample_alerts, sample_forecast};
use skydeck_weather::{
    CityId, Clock, Dashboard, SharedStore, SimulatedSource, SystemClock, WeatherStore,
};

use crate::error::AppError;
use crate::Config;

/// Main application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    dashboard: Dashboard,
    /// Drives readings for cities added from the picklist
    rng: StdRng,
}

impl App {
    /// Create a new application instance from the on-disk config
    pub fn new() -> Result<Self> {
        let (config, _warnings) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    /// Create an application around an already loaded config
    pub fn with_config(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.weather.rng_seed {
            // Offset so picklist readings don't mirror the refresh source
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };
        let dashboard = build_dashboard(&config, clock.clone());

        Self {
            config: Arc::new(config),
            clock,
            dashboard,
            rng,
        }
    }

    /// Run the initial load. A failed fetch is reported on the dashboard, not here.
    pub async fn initialize(&mut self) -> Result<()> {
        tracing::info!(
            "Initializing dashboard with {} cities",
            self.dashboard.cities().len()
        );

        if let Err(e) = self.dashboard.refresh().await {
            tracing::warn!("Initial weather load failed: {}", e);
        }

        tracing::info!("Application initialized successfully");
        Ok(())
    }

    /// Add a picklist city by label or name
    pub fn add_city(&mut self, query: &str) -> Result<CityId, AppError> {
        let now = self.clock.now();
        let id = self.dashboard.add_from_catalog(query, &mut self.rng, now)?;
        Ok(id)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!(
            "Shutting down with {} tracked cities",
            self.dashboard.cities().len()
        );
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }
}

fn build_dashboard(config: &Config, clock: Arc<dyn Clock>) -> Dashboard {
    let weather = &config.weather;
    let source = match weather.rng_seed {
        Some(seed) => SimulatedSource::seeded(seed, clock.clone()),
        None => SimulatedSource::new(clock.clone()),
    }
    .with_latency(weather.refresh_latency())
    .with_failure_rate(weather.failure_rate);

    let now = clock.now();
    let store = if config.dashboard.seed_default_cities {
        WeatherStore::with_records(default_cities(now))
    } else {
        WeatherStore::new()
    };

    let forecast = if config.dashboard.show_forecast {
        sample_forecast(now)
    } else {
        Vec::new()
    };

    Dashboard::new(SharedStore::new(store, Arc::new(source)))
        .with_unit(weather.temperature_unit)
        .with_forecast(forecast)
        .with_alerts(sample_alerts())
}
