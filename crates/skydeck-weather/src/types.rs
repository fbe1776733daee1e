use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Store-assigned identifier of a tracked city
pub type CityId = u64;

/// Glyph shown when a condition has no dedicated icon
pub const DEFAULT_ICON: &str = "🌤️";

/// Temperature unit used for display. Records are always stored in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> char {
        match self {
            Self::Celsius => 'C',
            Self::Fahrenheit => 'F',
        }
    }

    /// Convert a Celsius value into this unit
    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// The other unit, for a C/F toggle
    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            _ => Err(WeatherError::InvalidUnit(s.to_string())),
        }
    }
}

/// Known weather condition categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Foggy,
    Windy,
    PartlyCloudy,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 8] = [
        Self::Sunny,
        Self::Cloudy,
        Self::Rainy,
        Self::Snowy,
        Self::Stormy,
        Self::Foggy,
        Self::Windy,
        Self::PartlyCloudy,
    ];

    /// Case-insensitive lookup. Unknown strings yield `None`.
    pub fn parse(condition: &str) -> Option<Self> {
        match condition.to_ascii_lowercase().as_str() {
            "sunny" => Some(Self::Sunny),
            "cloudy" => Some(Self::Cloudy),
            "rainy" => Some(Self::Rainy),
            "snowy" => Some(Self::Snowy),
            "stormy" => Some(Self::Stormy),
            "foggy" => Some(Self::Foggy),
            "windy" => Some(Self::Windy),
            "partly-cloudy" => Some(Self::PartlyCloudy),
            _ => None,
        }
    }

    /// Wire name as carried in `WeatherRecord::condition`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
            Self::Stormy => "stormy",
            Self::Foggy => "foggy",
            Self::Windy => "windy",
            Self::PartlyCloudy => "partly-cloudy",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Sunny => "☀️",
            Self::Cloudy => "☁️",
            Self::Rainy => "🌧️",
            Self::Snowy => "❄️",
            Self::Stormy => "⛈️",
            Self::Foggy => "🌫️",
            Self::Windy => "💨",
            Self::PartlyCloudy => "⛅",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current weather snapshot for one tracked city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub id: CityId,
    pub city: String,
    pub country: String,
    /// Degrees Celsius
    pub temperature: i32,
    /// Relative humidity, percent
    pub humidity: u8,
    /// km/h
    pub wind_speed: u32,
    pub condition: String,
    pub icon: String,
    pub last_updated: DateTime<Utc>,
}

/// A record that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWeatherRecord {
    pub city: String,
    pub country: String,
    pub temperature: i32,
    pub humidity: u8,
    pub wind_speed: u32,
    pub condition: String,
    pub icon: String,
    pub last_updated: DateTime<Utc>,
}

impl NewWeatherRecord {
    /// Candidate with the icon matching `condition`
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        temperature: i32,
        humidity: u8,
        wind_speed: u32,
        condition: WeatherCondition,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            temperature,
            humidity,
            wind_speed,
            condition: condition.as_str().to_string(),
            icon: condition.icon().to_string(),
            last_updated,
        }
    }

    pub fn with_id(self, id: CityId) -> WeatherRecord {
        WeatherRecord {
            id,
            city: self.city,
            country: self.country,
            temperature: self.temperature,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            condition: self.condition,
            icon: self.icon,
            last_updated: self.last_updated,
        }
    }
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: DateTime<Utc>,
    pub high: i32,
    pub low: i32,
    pub condition: String,
    pub icon: String,
    /// Chance of precipitation, 0-100
    pub precipitation: u8,
}

/// Forecast for a single city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub city: String,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Watch,
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

/// Weather alert shown alongside the city list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub is_active: bool,
}
