//! In-memory store of tracked cities.
//!
//! A refresh is split in two halves so the store is never borrowed across
//! the simulated latency: `begin_refresh` snapshots the records and marks
//! the store as loading, `complete_refresh` applies the outcome in one step.
//! Adds and removes made in between are kept.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::WeatherError;
use crate::source::WeatherSource;
use crate::state::LoadState;
use crate::types::{CityId, NewWeatherRecord, WeatherRecord};

/// Message exposed to the UI when a refresh fails
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch weather data";

/// Proof that a refresh was started. Completing with a stale ticket is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The refresh ran; this many records received new readings
    Updated(usize),
    /// Another refresh was already in flight
    Skipped,
}

#[derive(Debug)]
pub struct WeatherStore {
    records: Vec<WeatherRecord>,
    state: LoadState,
    error: Option<String>,
    next_id: CityId,
    generation: u64,
}

impl Default for WeatherStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            state: LoadState::Idle,
            error: None,
            next_id: 1,
            generation: 0,
        }
    }

    /// Store pre-populated with seed cities, in order
    pub fn with_records(seeds: impl IntoIterator<Item = NewWeatherRecord>) -> Self {
        let mut store = Self::new();
        for seed in seeds {
            store.add(seed);
        }
        store
    }

    pub fn records(&self) -> &[WeatherRecord] {
        &self.records
    }

    pub fn get(&self, id: CityId) -> Option<&WeatherRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Case-insensitive match on the city name
    pub fn contains_city(&self, city: &str) -> bool {
        let needle = city.to_lowercase();
        self.records
            .iter()
            .any(|r| r.city.chars().flat_map(char::to_lowercase).eq(needle.chars()))
    }

    /// Append a city and return its new id. Ids come from a counter owned by
    /// the store, so they are unique and never reused.
    pub fn add(&mut self, candidate: NewWeatherRecord) -> CityId {
        let id = self.next_id;
        self.next_id += 1;

        tracing::debug!("Adding city {} ({}) as id {}", candidate.city, candidate.country, id);
        self.records.push(candidate.with_id(id));
        id
    }

    /// Remove a city by id. Unknown ids are ignored.
    pub fn remove(&mut self, id: CityId) -> Option<WeatherRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let removed = self.records.remove(index);
        tracing::debug!("Removed city {} (id {})", removed.city, id);
        Some(removed)
    }

    /// Enter `Loading` and snapshot the tracked records.
    ///
    /// Returns `None` if a refresh is already in flight.
    pub fn begin_refresh(&mut self) -> Option<(RefreshTicket, Vec<WeatherRecord>)> {
        if !self.state.can_start_refresh() {
            tracing::debug!("Refresh already in flight, ignoring request");
            return None;
        }

        self.generation += 1;
        self.state = LoadState::Loading;
        self.error = None;

        Some((
            RefreshTicket {
                generation: self.generation,
            },
            self.records.clone(),
        ))
    }

    /// Apply the result of a fetch started with `ticket`.
    ///
    /// On success the variable readings of every still-tracked record are
    /// replaced. On failure the records are left as they were and `error`
    /// is set.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        outcome: Result<Vec<WeatherRecord>, WeatherError>,
    ) -> Result<RefreshOutcome, WeatherError> {
        if ticket.generation != self.generation || !self.state.is_loading() {
            tracing::warn!("Discarding result of stale refresh {}", ticket.generation);
            return Ok(RefreshOutcome::Skipped);
        }

        match outcome {
            Ok(fresh) => {
                let mut fresh: HashMap<CityId, WeatherRecord> =
                    fresh.into_iter().map(|r| (r.id, r)).collect();

                let mut updated = 0;
                for record in &mut self.records {
                    if let Some(reading) = fresh.remove(&record.id) {
                        record.temperature = reading.temperature;
                        record.humidity = reading.humidity;
                        record.wind_speed = reading.wind_speed;
                        record.last_updated = reading.last_updated.max(record.last_updated);
                        updated += 1;
                    }
                }

                self.state = self.state.on_refresh_done(true);
                self.error = None;
                tracing::info!("Weather data refreshed for {} cities", updated);
                Ok(RefreshOutcome::Updated(updated))
            }
            Err(e) => {
                tracing::error!("Weather data fetch error: {}", e);
                self.state = self.state.on_refresh_done(false);
                self.error = Some(FETCH_ERROR_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    /// Fail a refresh whose future was dropped before it completed.
    fn abandon_refresh(&mut self, ticket: RefreshTicket) {
        tracing::warn!("Refresh {} dropped before completion", ticket.generation);
        let cancelled = Err(WeatherError::FetchFailed("refresh cancelled".to_string()));
        let _ = self.complete_refresh(ticket, cancelled);
    }

    /// Run a full refresh against `source`.
    ///
    /// Dropping the returned future mid-fetch counts as a failed refresh.
    pub async fn refresh<S>(&mut self, source: &S) -> Result<RefreshOutcome, WeatherError>
    where
        S: WeatherSource + ?Sized,
    {
        let Some((ticket, snapshot)) = self.begin_refresh() else {
            return Ok(RefreshOutcome::Skipped);
        };
        let pending = PendingRefresh {
            store: self,
            ticket: Some(ticket),
        };
        let outcome = source.fetch(snapshot).await;
        pending.complete(outcome)
    }
}

/// Refresh between `begin_refresh` and `complete_refresh`, borrowing the store.
struct PendingRefresh<'a> {
    store: &'a mut WeatherStore,
    ticket: Option<RefreshTicket>,
}

impl PendingRefresh<'_> {
    fn complete(
        mut self,
        outcome: Result<Vec<WeatherRecord>, WeatherError>,
    ) -> Result<RefreshOutcome, WeatherError> {
        match self.ticket.take() {
            Some(ticket) => self.store.complete_refresh(ticket, outcome),
            None => Ok(RefreshOutcome::Skipped),
        }
    }
}

impl Drop for PendingRefresh<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.store.abandon_refresh(ticket);
        }
    }
}

/// Same as `PendingRefresh` for a store behind a `SharedStore`.
struct SharedPendingRefresh {
    inner: Arc<Mutex<WeatherStore>>,
    ticket: Option<RefreshTicket>,
}

impl SharedPendingRefresh {
    fn complete(
        mut self,
        outcome: Result<Vec<WeatherRecord>, WeatherError>,
    ) -> Result<RefreshOutcome, WeatherError> {
        match self.ticket.take() {
            Some(ticket) => self.inner.lock().complete_refresh(ticket, outcome),
            None => Ok(RefreshOutcome::Skipped),
        }
    }
}

impl Drop for SharedPendingRefresh {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.inner.lock().abandon_refresh(ticket);
        }
    }
}

/// Cloneable handle sharing one store between the UI and a refresh task.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<WeatherStore>>,
    source: Arc<dyn WeatherSource>,
}

impl SharedStore {
    pub fn new(store: WeatherStore, source: Arc<dyn WeatherSource>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
            source,
        }
    }

    /// Read the store under the lock.
    pub fn with<T>(&self, f: impl FnOnce(&WeatherStore) -> T) -> T {
        f(&self.inner.lock())
    }

    /// Mutate the store under the lock. Keep `f` short and synchronous.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut WeatherStore) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn records(&self) -> Vec<WeatherRecord> {
        self.inner.lock().records().to_vec()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().error().map(str::to_string)
    }

    pub fn add(&self, candidate: NewWeatherRecord) -> CityId {
        self.inner.lock().add(candidate)
    }

    pub fn remove(&self, id: CityId) -> Option<WeatherRecord> {
        self.inner.lock().remove(id)
    }

    /// Refresh all records. The lock is released while the source is
    /// working, so adds and removes go through immediately. If the future
    /// is dropped mid-fetch the refresh is recorded as failed.
    pub async fn refresh(&self) -> Result<RefreshOutcome, WeatherError> {
        let begun = self.inner.lock().begin_refresh();
        let Some((ticket, snapshot)) = begun else {
            return Ok(RefreshOutcome::Skipped);
        };
        let pending = SharedPendingRefresh {
            inner: self.inner.clone(),
            ticket: Some(ticket),
        };

        let outcome = self.source.fetch(snapshot).await;
        pending.complete(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeatherCondition;
    use chrono::{TimeZone, Utc};

    fn candidate(city: &str) -> NewWeatherRecord {
        let at = Utc.with_ymd_and_hms(2023, 12, 1, 14, 30, 0).unwrap();
        NewWeatherRecord::new(city, "Test Country", 25, 70, 12, WeatherCondition::Cloudy, at)
    }

    #[test]
    fn test_new_store_is_idle_and_empty() {
        let store = WeatherStore::new();
        assert!(store.is_empty());
        assert_eq!(store.state(), LoadState::Idle);
        assert!(!store.is_loading());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn test_add_then_remove() {
        let mut store = WeatherStore::new();
        let id = store.add(candidate("Paris"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).map(|r| r.city.as_str()), Some("Paris"));

        assert!(store.remove(id).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_unique_for_back_to_back_adds() {
        let mut store = WeatherStore::new();
        let ids: Vec<CityId> = (0..50).map(|i| store.add(candidate(&format!("City {i}")))).collect();

        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut store = WeatherStore::new();
        let first = store.add(candidate("A"));
        store.remove(first);
        let second = store.add(candidate("B"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut store = WeatherStore::with_records([candidate("A"), candidate("B")]);
        let before = store.records().to_vec();

        assert!(store.remove(999).is_none());
        assert!(store.remove(999).is_none());
        assert_eq!(store.records(), before.as_slice());
    }

    #[test]
    fn test_insertion_order_kept() {
        let store = WeatherStore::with_records([candidate("C"), candidate("A"), candidate("B")]);
        let names: Vec<&str> = store.records().iter().map(|r| r.city.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn test_contains_city_ignores_case() {
        let store = WeatherStore::with_records([candidate("Paris")]);
        assert!(store.contains_city("paris"));
        assert!(store.contains_city("PARIS"));
        assert!(!store.contains_city("Berlin"));
        assert!(!store.contains_city("Pari"));
        assert!(!store.contains_city("Parisx"));

        let store = WeatherStore::with_records([candidate("Zürich")]);
        assert!(store.contains_city("ZÜRICH"));
    }

    #[test]
    fn test_second_begin_is_rejected_while_loading() {
        let mut store = WeatherStore::with_records([candidate("A")]);
        assert!(store.begin_refresh().is_some());
        assert!(store.is_loading());
        assert!(store.begin_refresh().is_none());
    }

    #[test]
    fn test_failed_refresh_keeps_records() {
        let mut store = WeatherStore::with_records([candidate("A"), candidate("B")]);
        let before = store.records().to_vec();

        let (ticket, _) = store.begin_refresh().unwrap();
        let result = store.complete_refresh(ticket, Err(WeatherError::FetchFailed("boom".into())));

        assert!(result.is_err());
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(store.error(), Some(FETCH_ERROR_MESSAGE));
        assert_eq!(store.state(), LoadState::Failed);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_success_clears_previous_error() {
        let mut store = WeatherStore::with_records([candidate("A")]);
        let (ticket, _) = store.begin_refresh().unwrap();
        let _ = store.complete_refresh(ticket, Err(WeatherError::FetchFailed("boom".into())));

        let (ticket, mut snapshot) = store.begin_refresh().unwrap();
        snapshot[0].temperature = 30;
        let result = store.complete_refresh(ticket, Ok(snapshot)).unwrap();

        assert_eq!(result, RefreshOutcome::Updated(1));
        assert_eq!(store.error(), None);
        assert_eq!(store.state(), LoadState::Ready);
        assert_eq!(store.records()[0].temperature, 30);
    }

    #[test]
    fn test_refresh_only_touches_variable_fields() {
        let mut store = WeatherStore::with_records([candidate("A")]);
        let (ticket, mut snapshot) = store.begin_refresh().unwrap();
        snapshot[0].city = "Renamed".into();
        snapshot[0].condition = "stormy".into();
        snapshot[0].humidity = 40;

        store.complete_refresh(ticket, Ok(snapshot)).unwrap();

        let record = &store.records()[0];
        assert_eq!(record.city, "A");
        assert_eq!(record.condition, "cloudy");
        assert_eq!(record.humidity, 40);
    }

    #[test]
    fn test_changes_during_refresh_survive() {
        let mut store = WeatherStore::with_records([candidate("A"), candidate("B")]);
        let (ticket, mut snapshot) = store.begin_refresh().unwrap();

        let removed = store.records()[0].id;
        store.remove(removed);
        let added = store.add(candidate("C"));

        for record in &mut snapshot {
            record.temperature = -5;
        }
        let result = store.complete_refresh(ticket, Ok(snapshot)).unwrap();

        assert_eq!(result, RefreshOutcome::Updated(1));
        assert!(store.get(removed).is_none());
        assert_eq!(store.get(added).map(|r| r.temperature), Some(25));
        assert_eq!(store.records()[0].temperature, -5);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut store = WeatherStore::with_records([candidate("A")]);
        let (stale, snapshot) = store.begin_refresh().unwrap();
        store.complete_refresh(stale, Ok(snapshot.clone())).unwrap();

        let result = store.complete_refresh(stale, Ok(snapshot)).unwrap();
        assert_eq!(result, RefreshOutcome::Skipped);
        assert_eq!(store.state(), LoadState::Ready);
    }

    /// Source whose fetch never finishes
    struct StalledSource;

    #[async_trait::async_trait]
    impl WeatherSource for StalledSource {
        async fn fetch(&self, _tracked: Vec<WeatherRecord>) -> Result<Vec<WeatherRecord>, WeatherError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropped_refresh_does_not_stay_loading() {
        let mut store = WeatherStore::with_records([candidate("A")]);
        let before = store.records().to_vec();

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(10), store.refresh(&StalledSource)).await;
        assert!(timed_out.is_err());

        assert_eq!(store.state(), LoadState::Failed);
        assert!(!store.is_loading());
        assert_eq!(store.error(), Some(FETCH_ERROR_MESSAGE));
        assert_eq!(store.records(), before.as_slice());
        assert!(store.begin_refresh().is_some());
    }
}
