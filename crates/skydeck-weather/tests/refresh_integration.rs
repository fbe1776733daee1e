//! Integration tests for the refresh lifecycle of the shared city store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use skydeck_weather::catalog::default_cities;
use skydeck_weather::{
    Dashboard, FixedClock, LoadState, NewWeatherRecord, RefreshOutcome, SharedStore,
    SimulatedSource, WeatherCondition, WeatherError, WeatherRecord, WeatherSource, WeatherStore,
    FETCH_ERROR_MESSAGE,
};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 12, 1, hour, 0, 0).unwrap()
}

/// Source that fails every fetch
struct FailingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl WeatherSource for FailingSource {
    async fn fetch(&self, _tracked: Vec<WeatherRecord>) -> Result<Vec<WeatherRecord>, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(WeatherError::FetchFailed("upstream unavailable".into()))
    }
}

fn simulated(latency: Duration, clock: Arc<FixedClock>) -> Arc<SimulatedSource> {
    Arc::new(SimulatedSource::seeded(2024, clock).with_latency(latency))
}

#[tokio::test]
async fn test_initial_load_moves_to_ready() {
    let clock = Arc::new(FixedClock::new(at(12)));
    let store = SharedStore::new(
        WeatherStore::with_records(default_cities(at(8))),
        simulated(Duration::ZERO, clock),
    );

    let outcome = store.refresh().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Updated(5));
    assert!(!store.is_loading());
    assert_eq!(store.error(), None);
    assert!(store.records().iter().all(|r| r.last_updated == at(12)));
    assert_eq!(store.with(|s| s.state()), LoadState::Ready);
}

#[tokio::test]
async fn test_failed_fetch_leaves_collection_unchanged() {
    let source = Arc::new(FailingSource {
        calls: AtomicUsize::new(0),
    });
    let store = SharedStore::new(WeatherStore::with_records(default_cities(at(8))), source.clone());
    let before = store.records();

    let err = store.refresh().await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(store.records(), before);
    assert_eq!(store.error().as_deref(), Some(FETCH_ERROR_MESSAGE));
    assert!(!store.is_loading());

    // Retrying is just another refresh
    let _ = store.refresh().await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_recovery_after_failure_clears_error() {
    let clock = Arc::new(FixedClock::new(at(12)));
    let mut store = WeatherStore::with_records(default_cities(at(8)));

    let failing = FailingSource {
        calls: AtomicUsize::new(0),
    };
    assert!(store.refresh(&failing).await.is_err());
    assert_eq!(store.state(), LoadState::Failed);

    let working = SimulatedSource::seeded(1, clock).with_latency(Duration::ZERO);
    store.refresh(&working).await.unwrap();
    assert_eq!(store.state(), LoadState::Ready);
    assert_eq!(store.error(), None);
}

#[tokio::test]
async fn test_overlapping_refresh_is_skipped() {
    let clock = Arc::new(FixedClock::new(at(12)));
    let store = SharedStore::new(
        WeatherStore::with_records(default_cities(at(8))),
        simulated(Duration::from_millis(100), clock),
    );

    let background = {
        let store = store.clone();
        tokio::spawn(async move { store.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(store.is_loading());
    assert_eq!(store.refresh().await.unwrap(), RefreshOutcome::Skipped);

    let first = background.await.unwrap().unwrap();
    assert_eq!(first, RefreshOutcome::Updated(5));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_refresh_recovers_after_caller_gives_up() {
    let clock = Arc::new(FixedClock::new(at(12)));
    let store = SharedStore::new(
        WeatherStore::with_records(default_cities(at(8))),
        simulated(Duration::from_millis(200), clock),
    );
    let before = store.records();

    let timed_out = tokio::time::timeout(Duration::from_millis(10), store.refresh()).await;
    assert!(timed_out.is_err());

    assert!(!store.is_loading());
    assert_eq!(store.error().as_deref(), Some(FETCH_ERROR_MESSAGE));
    assert_eq!(store.records(), before);

    let retried = store.refresh().await.unwrap();
    assert_eq!(retried, RefreshOutcome::Updated(5));
    assert!(!store.is_loading());
    assert_eq!(store.error(), None);
    assert_eq!(store.with(|s| s.state()), LoadState::Ready);
}

#[tokio::test]
async fn test_add_and_remove_during_refresh() {
    let clock = Arc::new(FixedClock::new(at(12)));
    let store = SharedStore::new(
        WeatherStore::with_records(default_cities(at(8))),
        simulated(Duration::from_millis(100), clock),
    );
    let dashboard = Dashboard::new(store.clone());

    let background = {
        let store = store.clone();
        tokio::spawn(async move { store.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Not blocked by the pending refresh
    let paris = NewWeatherRecord::new("Paris", "France", 19, 66, 9, WeatherCondition::Rainy, at(11));
    let paris_id = dashboard.add_city(paris.clone()).unwrap();
    let london_id = store.records()[1].id;
    assert!(dashboard.remove_city(london_id));

    let outcome = background.await.unwrap().unwrap();
    assert_eq!(outcome, RefreshOutcome::Updated(4));

    let records = store.records();
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.id != london_id));

    let added = records.iter().find(|r| r.id == paris_id).unwrap();
    assert_eq!(added.temperature, paris.temperature);
    assert_eq!(added.last_updated, at(11));
    assert_eq!(records.last().map(|r| r.city.as_str()), Some("Paris"));
}

#[tokio::test]
async fn test_ids_stay_unique_across_lifecycle() {
    let clock = Arc::new(FixedClock::new(at(12)));
    let store = SharedStore::new(WeatherStore::new(), simulated(Duration::ZERO, clock));

    let mut ids = Vec::new();
    for i in 0..20 {
        let record = NewWeatherRecord::new(format!("City {i}"), "Country", 20, 50, 5, WeatherCondition::Sunny, at(8));
        ids.push(store.add(record));
        if i % 3 == 0 {
            store.remove(ids[i / 2]);
            store.refresh().await.unwrap();
        }
    }

    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());

    let live: Vec<_> = store.records().iter().map(|r| r.id).collect();
    let mut live_sorted = live.clone();
    live_sorted.dedup();
    assert_eq!(live, live_sorted);
}

#[tokio::test]
async fn test_last_updated_is_monotonic_across_refreshes() {
    let clock = Arc::new(FixedClock::new(at(12)));
    let store = SharedStore::new(
        WeatherStore::with_records(default_cities(at(8))),
        simulated(Duration::ZERO, clock.clone()),
    );

    store.refresh().await.unwrap();
    clock.set(at(10));
    store.refresh().await.unwrap();

    assert!(store.records().iter().all(|r| r.last_updated == at(12)));

    clock.set(at(15));
    store.refresh().await.unwrap();
    assert!(store.records().iter().all(|r| r.last_updated == at(15)));
}

#[tokio::test]
async fn test_end_to_end_add_then_remove_from_empty() {
    let clock = Arc::new(FixedClock::new(at(12)));
    let dashboard = Dashboard::new(SharedStore::new(
        WeatherStore::new(),
        simulated(Duration::ZERO, clock),
    ));

    let paris = NewWeatherRecord::new("Paris", "France", 21, 60, 11, WeatherCondition::Sunny, at(12));
    let id = dashboard.add_city(paris).unwrap();

    let cities = dashboard.cities();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].id, id);
    assert_eq!(cities[0].city, "Paris");

    assert!(dashboard.remove_city(id));
    assert!(dashboard.cities().is_empty());
}
