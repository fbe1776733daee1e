use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use skydeck_weather::TemperatureUnit;

use crate::error::ConfigError;

/// Latencies above this are allowed but almost certainly a typo
const SLOW_LATENCY_MS: u64 = 60_000;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory, taken from the file's location on load
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Weather simulation settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Dashboard contents
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Display unit; readings are always stored in Celsius
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Simulated fetch latency in milliseconds
    #[serde(default = "default_refresh_latency_ms")]
    pub refresh_latency_ms: u64,

    /// Probability (0.0 - 1.0) that a simulated fetch fails
    #[serde(default)]
    pub failure_rate: f64,

    /// Fixed seed for reproducible readings; random when unset
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_refresh_latency_ms() -> u64 {
    1000
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Celsius,
            refresh_latency_ms: default_refresh_latency_ms(),
            failure_rate: 0.0,
            rng_seed: None,
        }
    }
}

impl WeatherConfig {
    pub fn refresh_latency(&self) -> Duration {
        Duration::from_millis(self.refresh_latency_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Track the built-in starter cities on launch
    #[serde(default = "default_seed_cities")]
    pub seed_default_cities: bool,

    /// Show the five-day forecast panel
    #[serde(default = "default_show_forecast")]
    pub show_forecast: bool,
}

fn default_seed_cities() -> bool {
    true
}

fn default_show_forecast() -> bool {
    true
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            seed_default_cities: default_seed_cities(),
            show_forecast: default_show_forecast(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skydeck")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, writing defaults", path.display());
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        if let Some(parent) = path.parent() {
            config.config_dir = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()))
                .context("Configuration validation failed");
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let rate = self.weather.failure_rate;
        if !(0.0..=1.0).contains(&rate) {
            result.add_error(
                "weather.failure_rate",
                format!("Must be between 0.0 and 1.0, got {}", rate),
            );
        } else if rate >= 1.0 {
            result.add_warning("weather.failure_rate", "Every refresh will fail");
        }

        if self.weather.refresh_latency_ms > SLOW_LATENCY_MS {
            result.add_warning(
                "weather.refresh_latency_ms",
                "Refresh latency is more than a minute",
            );
        }

        if !self.dashboard.seed_default_cities {
            result.add_warning(
                "dashboard.seed_default_cities",
                "Dashboard starts empty until a city is added",
            );
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skydeck");

        Ok(config_dir.join("config.toml"))
    }
}
