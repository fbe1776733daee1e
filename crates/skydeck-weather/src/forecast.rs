//! Five-day forecast panel and weather alerts.
//!
//! Forecast data is static sample data anchored at a given instant; the
//! store never mutates it.

use chrono::{DateTime, Duration, Utc};

use crate::format::format_date;
use crate::types::{AlertKind, AlertSeverity, ForecastDay, WeatherAlert, WeatherCondition};

pub const FORECAST_DAYS: usize = 5;

fn day(date: DateTime<Utc>, high: i32, low: i32, condition: WeatherCondition, precipitation: u8) -> ForecastDay {
    ForecastDay {
        date,
        high,
        low,
        condition: condition.as_str().to_string(),
        icon: condition.icon().to_string(),
        precipitation,
    }
}

/// Sample forecast starting at `start` (today) and stepping one day at a time
pub fn sample_forecast(start: DateTime<Utc>) -> Vec<ForecastDay> {
    let at = |offset: i64| start + Duration::days(offset);

    vec![
        day(at(0), 25, 18, WeatherCondition::Sunny, 0),
        day(at(1), 23, 16, WeatherCondition::PartlyCloudy, 10),
        day(at(2), 20, 14, WeatherCondition::Rainy, 75),
        day(at(3), 22, 15, WeatherCondition::Cloudy, 20),
        day(at(4), 26, 19, WeatherCondition::Sunny, 5),
    ]
}

/// "Today" for the first row, the short date otherwise
pub fn day_label(index: usize, day: &ForecastDay) -> String {
    if index == 0 {
        "Today".to_string()
    } else {
        format_date(day.date)
    }
}

impl ForecastDay {
    /// Dry days hide the precipitation badge
    pub fn shows_precipitation(&self) -> bool {
        self.precipitation > 0
    }
}

pub fn sample_alerts() -> Vec<WeatherAlert> {
    vec![
        WeatherAlert {
            id: "alert-1".to_string(),
            kind: AlertKind::Warning,
            title: "Heat Wave Warning".to_string(),
            description: "Extremely high temperatures expected. Stay hydrated and avoid prolonged sun exposure."
                .to_string(),
            severity: AlertSeverity::High,
            is_active: true,
        },
        WeatherAlert {
            id: "alert-2".to_string(),
            kind: AlertKind::Watch,
            title: "Storm Watch".to_string(),
            description: "Severe thunderstorms possible this evening. Monitor weather conditions."
                .to_string(),
            severity: AlertSeverity::Medium,
            is_active: false,
        },
    ]
}
