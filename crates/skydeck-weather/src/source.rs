//! Where refreshed readings come from.
//!
//! There is no real weather API: `SimulatedSource` waits for a fixed latency
//! and then nudges every tracked reading by a small random amount. Time and
//! randomness are injected so tests can pin both.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::WeatherError;
use crate::types::WeatherRecord;

/// Simulated network latency
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

/// Humidity stays inside this range after a refresh
pub const HUMIDITY_RANGE: RangeInclusive<i64> = 30..=95;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always reports the same instant (settable)
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Produces refreshed readings for a snapshot of tracked records.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Return one record per input record, matched by `id`.
    async fn fetch(&self, tracked: Vec<WeatherRecord>) -> Result<Vec<WeatherRecord>, WeatherError>;
}

/// Width of the random perturbation applied to each field on refresh.
///
/// A spread of `s` moves the value by `round((r - 0.5) * s)` for uniform `r` in [0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
}

impl Default for Jitter {
    fn default() -> Self {
        Self {
            temperature: 4.0,
            humidity: 10.0,
            wind_speed: 6.0,
        }
    }
}

impl Jitter {
    /// No movement at all; refresh only touches `last_updated`
    pub fn none() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            wind_speed: 0.0,
        }
    }
}

pub struct SimulatedSource<R = StdRng> {
    rng: Mutex<R>,
    clock: Arc<dyn Clock>,
    latency: Duration,
    jitter: Jitter,
    failure_rate: f64,
}

impl SimulatedSource<StdRng> {
    /// Source seeded from the operating system
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(StdRng::from_os_rng(), clock)
    }

    /// Deterministic source for reproducible runs
    pub fn seeded(seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), clock)
    }
}

impl<R: Rng + Send> SimulatedSource<R> {
    pub fn with_rng(rng: R, clock: Arc<dyn Clock>) -> Self {
        Self {
            rng: Mutex::new(rng),
            clock,
            latency: DEFAULT_LATENCY,
            jitter: Jitter::default(),
            failure_rate: 0.0,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Probability in [0, 1] that a fetch fails. Values outside are clamped.
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    fn offset(rng: &mut R, spread: f64) -> i64 {
        ((rng.random::<f64>() - 0.5) * spread).round() as i64
    }

    fn perturb(&self, tracked: Vec<WeatherRecord>) -> Result<Vec<WeatherRecord>, WeatherError> {
        let mut rng = self.rng.lock();

        if self.failure_rate > 0.0 && rng.random::<f64>() < self.failure_rate {
            return Err(WeatherError::FetchFailed(
                "simulated upstream failure".to_string(),
            ));
        }

        let now = self.clock.now();
        let jitter = self.jitter;

        let updated = tracked
            .into_iter()
            .map(|record| {
                let temperature = i64::from(record.temperature)
                    + Self::offset(&mut rng, jitter.temperature);
                let humidity = (i64::from(record.humidity) + Self::offset(&mut rng, jitter.humidity))
                    .clamp(*HUMIDITY_RANGE.start(), *HUMIDITY_RANGE.end());
                let wind_speed =
                    (i64::from(record.wind_speed) + Self::offset(&mut rng, jitter.wind_speed)).max(0);

                WeatherRecord {
                    temperature: temperature.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
                    humidity: humidity as u8,
                    wind_speed: wind_speed.min(i64::from(u32::MAX)) as u32,
                    last_updated: now.max(record.last_updated),
                    ..record
                }
            })
            .collect();

        Ok(updated)
    }
}

#[async_trait]
impl<R: Rng + Send + 'static> WeatherSource for SimulatedSource<R> {
    async fn fetch(&self, tracked: Vec<WeatherRecord>) -> Result<Vec<WeatherRecord>, WeatherError> {
        tracing::debug!(
            "Simulating weather fetch for {} cities ({:?} latency)",
            tracked.len(),
            self.latency
        );
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.perturb(tracked)
    }
}
