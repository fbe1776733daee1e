//! Dashboard façade: the tracked cities plus everything displayed around them.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::catalog;
use crate::error::WeatherError;
use crate::format::{format_temperature, is_extreme_weather};
use crate::state::LoadState;
use crate::store::{RefreshOutcome, SharedStore};
use crate::types::{CityId, ForecastDay, NewWeatherRecord, TemperatureUnit, WeatherAlert, WeatherRecord};

/// Summary panel values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    pub cities_tracked: usize,
    /// Mean temperature in Celsius, `None` with no cities
    pub average_temperature: Option<f64>,
    /// Timestamp of the first tracked city
    pub last_updated: Option<DateTime<Utc>>,
    pub extreme_count: usize,
}

impl QuickStats {
    pub fn from_records(records: &[WeatherRecord]) -> Self {
        let average_temperature = if records.is_empty() {
            None
        } else {
            let sum: f64 = records.iter().map(|r| f64::from(r.temperature)).sum();
            Some(sum / records.len() as f64)
        };

        Self {
            cities_tracked: records.len(),
            average_temperature,
            last_updated: records.first().map(|r| r.last_updated),
            extreme_count: records.iter().filter(|r| is_extreme_weather(r)).count(),
        }
    }

    /// Average formatted in `unit`, or "N/A"
    pub fn average_display(&self, unit: TemperatureUnit) -> String {
        self.average_temperature
            .map(|avg| format_temperature(avg, unit))
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Everything the presentation layer needs to draw one frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub cities: Vec<WeatherRecord>,
    pub state: LoadState,
    pub loading: bool,
    pub error: Option<String>,
    pub unit: TemperatureUnit,
    pub forecast: Vec<ForecastDay>,
    pub alerts: Vec<WeatherAlert>,
    pub stats: QuickStats,
}

pub struct Dashboard {
    store: SharedStore,
    unit: TemperatureUnit,
    forecast: Vec<ForecastDay>,
    alerts: Vec<WeatherAlert>,
}

impl Dashboard {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            unit: TemperatureUnit::default(),
            forecast: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: TemperatureUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_forecast(mut self, forecast: Vec<ForecastDay>) -> Self {
        self.forecast = forecast;
        self
    }

    pub fn with_alerts(mut self, alerts: Vec<WeatherAlert>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn cities(&self) -> Vec<WeatherRecord> {
        self.store.records()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        self.unit = unit;
    }

    pub fn toggle_unit(&mut self) -> TemperatureUnit {
        self.unit = self.unit.toggled();
        self.unit
    }

    pub fn forecast(&self) -> &[ForecastDay] {
        &self.forecast
    }

    pub fn active_alerts(&self) -> impl Iterator<Item = &WeatherAlert> {
        self.alerts.iter().filter(|a| a.is_active)
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome, WeatherError> {
        self.store.refresh().await
    }

    /// Add a city unless one with the same name (ignoring case) is tracked.
    pub fn add_city(&self, candidate: NewWeatherRecord) -> Result<CityId, WeatherError> {
        // Check and insert under one lock so two callers can't both pass the guard
        let result = self.store.with_mut(|store| {
            if store.contains_city(&candidate.city) {
                Err(WeatherError::DuplicateCity(candidate.city.clone()))
            } else {
                Ok(store.add(candidate))
            }
        });

        match &result {
            Ok(id) => tracing::info!("City added (id {})", id),
            Err(e) => tracing::warn!("Rejected city: {}", e),
        }
        result
    }

    /// Add a city from the picklist with synthesized readings.
    pub fn add_from_catalog<R: Rng + ?Sized>(
        &self,
        query: &str,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<CityId, WeatherError> {
        let choice =
            catalog::find_city(query).ok_or_else(|| WeatherError::UnknownCity(query.to_string()))?;
        self.add_city(catalog::synthesize(choice, rng, now))
    }

    /// Returns false if no city had that id.
    pub fn remove_city(&self, id: CityId) -> bool {
        let removed = self.store.remove(id);
        if let Some(record) = &removed {
            tracing::info!("City removed: {}", record.city);
        }
        removed.is_some()
    }

    pub fn stats(&self) -> QuickStats {
        self.store.with(|store| QuickStats::from_records(store.records()))
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let (cities, state, error) = self.store.with(|store| {
            (
                store.records().to_vec(),
                store.state(),
                store.error().map(str::to_string),
            )
        });
        let stats = QuickStats::from_records(&cities);

        DashboardSnapshot {
            cities,
            state,
            loading: state.is_loading(),
            error,
            unit: self.unit,
            forecast: self.forecast.clone(),
            alerts: self.alerts.clone(),
            stats,
        }
    }
}
