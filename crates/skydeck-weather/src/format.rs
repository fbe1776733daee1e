//! Display helpers: unit conversion, icons, compass bucketing, temperature
//! bands and the extreme-weather predicate.
//!
//! Everything here is a pure function over its arguments.

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{TemperatureUnit, WeatherCondition, WeatherRecord, DEFAULT_ICON};

/// Round to the nearest whole degree (ties away from zero) and append the unit.
pub fn format_temperature(value: f64, unit: TemperatureUnit) -> String {
    let rounded = unit.convert(value).round() as i64;
    format!("{}°{}", rounded, unit.symbol())
}

/// 12-hour clock time in the local time zone, e.g. `2:30 PM`
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    format_time_in(timestamp, &Local)
}

pub fn format_time_in<Tz: TimeZone>(timestamp: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    timestamp.with_timezone(tz).format("%-I:%M %p").to_string()
}

/// Short weekday, short month and day in the local time zone, e.g. `Fri, Dec 1`
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    format_date_in(timestamp, &Local)
}

pub fn format_date_in<Tz: TimeZone>(timestamp: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    timestamp.with_timezone(tz).format("%a, %b %-d").to_string()
}

/// Glyph for a condition string. Unknown and empty conditions get the default glyph.
pub fn weather_icon(condition: &str) -> &'static str {
    WeatherCondition::parse(condition)
        .map(|c| c.icon())
        .unwrap_or(DEFAULT_ICON)
}

/// "partly-cloudy" -> "Partly Cloudy"
pub fn condition_label(condition: &str) -> String {
    condition
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Eight-point compass rose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    const ROSE: [CompassPoint; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket a bearing into the nearest compass point. Any real number is
/// accepted; 360 and -360 are both north.
pub fn wind_direction(degrees: f64) -> CompassPoint {
    let normalized = degrees.rem_euclid(360.0);
    let index = (normalized / 45.0).round() as usize % 8;
    CompassPoint::ROSE[index]
}

/// Severity band for a Celsius temperature. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBand {
    /// below 0
    Freezing,
    /// 0 to 10
    Cold,
    /// 10 to 20
    Mild,
    /// 20 to 30
    Warm,
    /// 30 to 35
    Hot,
    /// 35 and above
    Scorching,
}

impl TemperatureBand {
    /// Stable token the presentation layer maps to a concrete colour
    pub fn token(&self) -> &'static str {
        match self {
            Self::Freezing => "freezing",
            Self::Cold => "cold",
            Self::Mild => "mild",
            Self::Warm => "warm",
            Self::Hot => "hot",
            Self::Scorching => "scorching",
        }
    }
}

pub fn temperature_color(temp: f64) -> TemperatureBand {
    if temp < 0.0 {
        TemperatureBand::Freezing
    } else if temp < 10.0 {
        TemperatureBand::Cold
    } else if temp < 20.0 {
        TemperatureBand::Mild
    } else if temp < 30.0 {
        TemperatureBand::Warm
    } else if temp < 35.0 {
        TemperatureBand::Hot
    } else {
        TemperatureBand::Scorching
    }
}

pub fn is_extreme_weather(record: &WeatherRecord) -> bool {
    record.temperature > 35
        || record.temperature < -10
        || record.wind_speed > 50
        || record.humidity > 90
}
