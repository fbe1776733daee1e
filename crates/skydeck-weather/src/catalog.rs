//! Cities the dashboard knows about: the add-city picklist and the default
//! set tracked on first launch.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::types::{NewWeatherRecord, WeatherCondition};

/// A selectable `(city, country)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityChoice {
    pub name: &'static str,
    pub country: &'static str,
}

impl CityChoice {
    /// "Paris, France"
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

pub const PREDEFINED_CITIES: [CityChoice; 8] = [
    CityChoice { name: "Paris", country: "France" },
    CityChoice { name: "Berlin", country: "Germany" },
    CityChoice { name: "Rome", country: "Italy" },
    CityChoice { name: "Madrid", country: "Spain" },
    CityChoice { name: "Amsterdam", country: "Netherlands" },
    CityChoice { name: "Barcelona", country: "Spain" },
    CityChoice { name: "Vienna", country: "Austria" },
    CityChoice { name: "Prague", country: "Czech Republic" },
];

/// Conditions a newly added city can start with
const NEW_CITY_CONDITIONS: [WeatherCondition; 4] = [
    WeatherCondition::Sunny,
    WeatherCondition::Cloudy,
    WeatherCondition::PartlyCloudy,
    WeatherCondition::Rainy,
];

/// Look up a picklist entry by its "City, Country" label or by city name
/// (case-insensitive).
pub fn find_city(query: &str) -> Option<&'static CityChoice> {
    let query = query.trim();
    PREDEFINED_CITIES.iter().find(|c| {
        c.label().eq_ignore_ascii_case(query) || c.name.eq_ignore_ascii_case(query)
    })
}

/// Make up plausible readings for a city picked from the list.
pub fn synthesize<R: Rng + ?Sized>(
    choice: &CityChoice,
    rng: &mut R,
    now: DateTime<Utc>,
) -> NewWeatherRecord {
    let condition = NEW_CITY_CONDITIONS[rng.random_range(0..NEW_CITY_CONDITIONS.len())];

    NewWeatherRecord::new(
        choice.name,
        choice.country,
        rng.random_range(5..=35),
        rng.random_range(40..=80),
        rng.random_range(5..=30),
        condition,
        now,
    )
}

/// Cities tracked before the user adds any
pub fn default_cities(now: DateTime<Utc>) -> Vec<NewWeatherRecord> {
    vec![
        NewWeatherRecord::new("New York", "USA", 22, 65, 15, WeatherCondition::PartlyCloudy, now),
        NewWeatherRecord::new("London", "UK", 18, 78, 12, WeatherCondition::Cloudy, now),
        NewWeatherRecord::new("Tokyo", "Japan", 28, 55, 8, WeatherCondition::Sunny, now),
        NewWeatherRecord::new("Sydney", "Australia", 25, 60, 20, WeatherCondition::Windy, now),
        NewWeatherRecord::new("Dubai", "UAE", 38, 45, 10, WeatherCondition::Sunny, now),
    ]
}
